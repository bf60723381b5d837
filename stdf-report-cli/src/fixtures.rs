//! Record builders shared by the unit tests

use std::sync::Arc;
use stdf_decoder::schema::v4;
use stdf_decoder::{Endianness, FieldValue, Record, RecordSchema, StdfWriter};

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

fn u(v: u64) -> FieldValue {
    FieldValue::Unsigned(v)
}

fn record(schema: &'static RecordSchema, values: Vec<FieldValue>) -> Record {
    Record {
        schema,
        index: 0,
        source_file: Arc::from("fixture.stdf"),
        values: values.into_iter().map(Some).collect(),
    }
}

pub fn ptr(test_num: u64, head: u64, site: u64, result: f64, txt: &str, lo: f64, hi: f64) -> Record {
    record(
        &v4::PTR,
        vec![
            u(test_num),
            u(head),
            u(site),
            u(0),
            u(0),
            FieldValue::Float(result),
            text(txt),
            text(""),
            u(0),
            FieldValue::Signed(0),
            FieldValue::Signed(0),
            FieldValue::Signed(0),
            FieldValue::Float(lo),
            FieldValue::Float(hi),
            text("V"),
        ],
    )
}

pub fn prr(site: u64, part_flg: u64, soft_bin: u64, hard_bin: u64, part_id: &str) -> Record {
    record(
        &v4::PRR,
        vec![
            u(1),
            u(site),
            u(part_flg),
            u(0),
            u(hard_bin),
            u(soft_bin),
            FieldValue::Signed(-1),
            FieldValue::Signed(-1),
            u(0),
            text(part_id),
        ],
    )
}

pub fn sbr(num: u64, name: &str) -> Record {
    record(&v4::SBR, vec![u(255), u(255), u(num), u(1), text("P"), text(name)])
}

pub fn hbr(num: u64, name: &str) -> Record {
    record(&v4::HBR, vec![u(255), u(255), u(num), u(1), text("P"), text(name)])
}

pub fn mir(start_t: u64, job: &str, node: &str) -> Record {
    record(
        &v4::MIR,
        vec![
            u(start_t),
            u(start_t),
            u(1),
            text("P"),
            text(" "),
            text(" "),
            u(0),
            text(" "),
            text("LOT1"),
            text("PART"),
            text(node),
            text("TESTER"),
            text(job),
        ],
    )
}

pub fn mrr(finish_t: u64) -> Record {
    record(&v4::MRR, vec![u(finish_t)])
}

/// Encode records as a little-endian STDF stream
pub fn stdf_bytes(records: &[Record]) -> Vec<u8> {
    let mut writer = StdfWriter::new(Vec::new(), Endianness::Little).unwrap();
    for r in records {
        let values: Vec<FieldValue> = r.values.iter().map_while(|v| v.clone()).collect();
        writer.write_record(r.schema, &values).unwrap();
    }
    writer.finish().unwrap()
}
