use super::*;
use csv::StringRecord;
use std::sync::Arc;

fn records(headers: &[&str], rows: &[&[&str]]) -> Vec<Record> {
    let headers = Arc::new(StringRecord::from(headers.to_vec()));
    rows.iter()
        .map(|fields| Record::new(Arc::clone(&headers), StringRecord::from(fields.to_vec())))
        .collect()
}

fn numbered_records(count: usize) -> Vec<Record> {
    let headers = Arc::new(StringRecord::from(vec!["Order Id"]));
    (0..count)
        .map(|i| {
            Record::new(
                Arc::clone(&headers),
                StringRecord::from(vec![i.to_string()]),
            )
        })
        .collect()
}

fn freight_records(rows: &[&[&str]]) -> Vec<Record> {
    records(
        &[
            "Carrier",
            "orig_port_cd",
            "dest_port_cd",
            "minm_wgh_qty",
            "max_wgh_qty",
            "rate",
            "mode_dsc",
            "svc_cd",
        ],
        rows,
    )
}

#[test]
fn one_document_per_record() {
    let rows = freight_records(&[
        &["V444_0", "PORT08", "PORT09", "0", "100", "1.5", "AIR", "DTD"],
        &["V444_1", "PORT08", "PORT09", "100", "250", "2.5", "AIR", "DTD"],
        &["V444_2", "PORT03", "PORT09", "0", "50", "0.75", "GROUND", "DTP"],
    ]);

    let documents = build_documents(&rows, DatasetKind::FreightRates, None);

    assert_eq!(documents.len(), rows.len());
}

#[test]
fn freight_template_renders_all_fields() {
    let rows = freight_records(&[&[
        "V444_0", "PORT08", "PORT09", "250", "499.99", "3.1", "AIR", "DTD",
    ]]);

    let doc = &build_documents(&rows, DatasetKind::FreightRates, None)[0];

    assert!(doc.content.contains("Carrier: V444_0"));
    assert!(doc.content.contains("Puerto de Origen: PORT08"));
    assert!(doc.content.contains("Puerto de Destino: PORT09"));
    assert!(doc.content.contains("- Mínimo: 250 kg"));
    assert!(doc.content.contains("- Máximo: 499.99 kg"));
    assert!(doc.content.contains("Tarifa: $3.10"));
    assert!(doc.content.contains("Modo de Transporte: AIR"));
    assert!(doc.content.contains("Tipo de Servicio: DTD"));

    assert_eq!(doc.metadata.get("source").map(String::as_str), Some("freight_rates"));
    assert_eq!(doc.metadata.get("carrier").map(String::as_str), Some("V444_0"));
    assert_eq!(doc.metadata.get("mode").map(String::as_str), Some("AIR"));
}

#[test]
fn missing_fields_render_placeholder() {
    let rows = records(&["Carrier"], &[&["V444_0"]]);

    let doc = &build_documents(&rows, DatasetKind::FreightRates, None)[0];

    // Every declared template field still appears, with the placeholder
    // where the source row has no value.
    assert!(doc.content.contains("Puerto de Origen: N/A"));
    assert!(doc.content.contains("Puerto de Destino: N/A"));
    assert!(doc.content.contains("Modo de Transporte: N/A"));
    assert!(doc.content.contains("Tipo de Servicio: N/A"));
    // Missing rate falls back to the declared numeric default.
    assert!(doc.content.contains("Tarifa: $0.00"));
}

#[test]
fn supply_chain_template_and_metadata() {
    let rows = records(
        &[
            "Order Id",
            "Customer Full Name",
            "Customer Segment",
            "Customer City",
            "Customer State",
            "Customer Country",
            "Product Name",
            "Category Name",
            "Department Name",
            "Product Price",
            "Order Item Quantity",
            "Shipping Mode",
            "Delivery Status",
            "Days for shipping (scheduled)",
            "Days for shipping (real)",
            "Market",
            "Order Region",
        ],
        &[&[
            "75939",
            "Mary Smith",
            "Consumer",
            "Caguas",
            "PR",
            "Puerto Rico",
            "Field & Stream Gun Safe",
            "Fishing",
            "Fan Shop",
            "399.98",
            "2",
            "Standard Class",
            "Advance shipping",
            "4",
            "3",
            "LATAM",
            "Central America",
        ]],
    );

    let doc = &build_documents(&rows, DatasetKind::SupplyChain, Some(500))[0];

    assert!(doc.content.starts_with("Orden de Envío #75939"));
    assert!(doc.content.contains("Cliente: Mary Smith (Consumer)"));
    assert!(doc.content.contains("Ciudad: Caguas, PR, Puerto Rico"));
    assert!(doc.content.contains("Categoría: Fishing > Fan Shop"));
    assert!(doc.content.contains("Precio: $399.98"));
    assert!(doc.content.contains("Cantidad: 2"));
    assert!(doc.content.contains("- Modo: Standard Class"));
    assert!(doc.content.contains("- Estado: Advance shipping"));
    assert!(doc.content.contains("- Días programados: 4"));
    assert!(doc.content.contains("- Días reales: 3"));
    assert!(doc.content.contains("Mercado: LATAM"));
    assert!(doc.content.contains("Región: Central America"));

    assert_eq!(
        doc.metadata.get("source").map(String::as_str),
        Some("supply_chain_dataset")
    );
    assert_eq!(doc.metadata.get("order_id").map(String::as_str), Some("75939"));
    assert_eq!(doc.metadata.get("category").map(String::as_str), Some("Fishing"));
    assert_eq!(
        doc.metadata.get("shipping_mode").map(String::as_str),
        Some("Standard Class")
    );
    assert_eq!(doc.metadata.get("market").map(String::as_str), Some("LATAM"));
}

#[test]
fn supply_chain_money_renders_two_decimals() {
    let rows = records(&["Order Id", "Product Price"], &[&["1", "5"]]);

    let doc = &build_documents(&rows, DatasetKind::SupplyChain, None)[0];

    assert!(doc.content.contains("Precio: $5.00"));
}

#[test]
fn orders_template_and_metadata() {
    let rows = records(
        &[
            "Order ID",
            "Origin Port",
            "Plant Code",
            "Unit quantity",
            "Weight",
            "Service Level",
            "Carrier",
        ],
        &[&["1447296447", "PORT09", "PLANT16", "808", "14.3", "CRF", "V44_3"]],
    );

    let doc = &build_documents(&rows, DatasetKind::Orders, None)[0];

    assert!(doc.content.contains("ID de Orden: 1447296447"));
    assert!(doc.content.contains("Origen: PORT09"));
    assert!(doc.content.contains("Destino: Puerto de destino"));
    assert!(doc.content.contains("Planta: PLANT16"));
    assert!(doc.content.contains("Unidades: 808"));
    assert!(doc.content.contains("Peso: 14.3 kg"));
    assert!(doc.content.contains("Servicio: CRF"));
    assert!(doc.content.contains("Carrier: V44_3"));

    assert_eq!(doc.metadata.get("source").map(String::as_str), Some("order_list"));
    assert_eq!(
        doc.metadata.get("order_id").map(String::as_str),
        Some("1447296447")
    );
    assert_eq!(doc.metadata.get("origin").map(String::as_str), Some("PORT09"));
    assert_eq!(doc.metadata.get("plant").map(String::as_str), Some("PLANT16"));
}

#[test]
fn row_index_is_order_id_fallback() {
    let rows = records(&["Origin Port"], &[&["PORT01"], &["PORT02"]]);

    let documents = build_documents(&rows, DatasetKind::Orders, None);

    assert!(documents[0].content.contains("ID de Orden: 0"));
    assert!(documents[1].content.contains("ID de Orden: 1"));
}

#[test]
fn sampling_caps_oversized_row_sets() {
    let rows = numbered_records(50);

    let documents = build_documents(&rows, DatasetKind::SupplyChain, Some(10));

    assert_eq!(documents.len(), 10);
}

#[test]
fn sampling_is_deterministic() {
    let rows = numbered_records(100);

    let first = build_documents(&rows, DatasetKind::SupplyChain, Some(25));
    let second = build_documents(&rows, DatasetKind::SupplyChain, Some(25));

    // Same rows in the same order on every run.
    assert_eq!(first, second);
}

#[test]
fn no_sampling_at_or_under_cap() {
    let rows = records(&["Order Id"], &[&["1"], &["2"], &["3"]]);

    let documents = build_documents(&rows, DatasetKind::SupplyChain, Some(3));

    assert_eq!(documents.len(), 3);
    assert!(documents[0].content.starts_with("Orden de Envío #1"));
    assert!(documents[2].content.starts_with("Orden de Envío #3"));
}
