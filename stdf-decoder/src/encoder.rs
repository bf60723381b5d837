//! STDF V4 stream writer
//!
//! Encodes records with the same schemas the decoder reads. Useful for
//! producing small fixture files and for re-emitting filtered streams.

use crate::formats::Endianness;
use crate::schema::{v4, RecordSchema};
use crate::types::{DecoderError, FieldKind, FieldValue, Result};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::Write;

/// Writes an STDF stream, starting with the FAR record
pub struct StdfWriter<W: Write> {
    writer: W,
    endianness: Endianness,
}

impl<W: Write> StdfWriter<W> {
    /// Create a writer and emit the FAR record for the given byte order
    pub fn new(writer: W, endianness: Endianness) -> Result<Self> {
        let cpu_type = match endianness {
            Endianness::Big => 1,
            Endianness::Little => 2,
        };
        let mut stdf = Self { writer, endianness };
        stdf.write_record(
            &v4::FAR,
            &[FieldValue::Unsigned(cpu_type), FieldValue::Unsigned(4)],
        )?;
        Ok(stdf)
    }

    /// Encode one record
    ///
    /// `values` fill the schema fields in order; fields past the end of the
    /// slice are omitted from the body.
    pub fn write_record(&mut self, schema: &RecordSchema, values: &[FieldValue]) -> Result<()> {
        if values.len() > schema.fields.len() {
            return Err(DecoderError::InvalidData(format!(
                "{} has {} fields, got {} values",
                schema.name,
                schema.fields.len(),
                values.len()
            )));
        }

        let mut body = Vec::new();
        for (field, value) in schema.fields.iter().zip(values) {
            encode_field(&mut body, field.kind, value, self.endianness).map_err(|msg| {
                DecoderError::InvalidData(format!("{}.{}: {}", schema.name, field.name, msg))
            })?;
        }

        let rec_len = u16::try_from(body.len()).map_err(|_| {
            DecoderError::InvalidData(format!("{} body exceeds 65535 bytes", schema.name))
        })?;
        match self.endianness {
            Endianness::Big => self.writer.write_u16::<BigEndian>(rec_len)?,
            Endianness::Little => self.writer.write_u16::<LittleEndian>(rec_len)?,
        }
        self.writer.write_all(&[schema.rec_typ, schema.rec_sub])?;
        self.writer.write_all(&body)?;
        Ok(())
    }

    /// Flush and return the inner writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn encode_field(
    out: &mut Vec<u8>,
    kind: FieldKind,
    value: &FieldValue,
    e: Endianness,
) -> std::result::Result<(), String> {
    let unsigned = || value.as_u64().ok_or_else(|| format!("expected unsigned, got {:?}", value));
    let signed = || value.as_i64().ok_or_else(|| format!("expected integer, got {:?}", value));
    let float = || value.as_f64().ok_or_else(|| format!("expected number, got {:?}", value));
    let narrow = |v: u64, max: u64| {
        if v <= max {
            Ok(v)
        } else {
            Err(format!("{} does not fit", v))
        }
    };
    let big = e == Endianness::Big;

    match kind {
        FieldKind::U1 | FieldKind::B1 => out.push(narrow(unsigned()?, u8::MAX as u64)? as u8),
        FieldKind::U2 => {
            let v = narrow(unsigned()?, u16::MAX as u64)? as u16;
            out.extend_from_slice(&if big { v.to_be_bytes() } else { v.to_le_bytes() });
        }
        FieldKind::U4 => {
            let v = narrow(unsigned()?, u32::MAX as u64)? as u32;
            out.extend_from_slice(&if big { v.to_be_bytes() } else { v.to_le_bytes() });
        }
        FieldKind::I1 => {
            let v = i8::try_from(signed()?).map_err(|err| err.to_string())?;
            out.push(v as u8);
        }
        FieldKind::I2 => {
            let v = i16::try_from(signed()?).map_err(|err| err.to_string())?;
            out.extend_from_slice(&if big { v.to_be_bytes() } else { v.to_le_bytes() });
        }
        FieldKind::I4 => {
            let v = i32::try_from(signed()?).map_err(|err| err.to_string())?;
            out.extend_from_slice(&if big { v.to_be_bytes() } else { v.to_le_bytes() });
        }
        FieldKind::R4 => {
            let v = float()? as f32;
            out.extend_from_slice(&if big { v.to_be_bytes() } else { v.to_le_bytes() });
        }
        FieldKind::R8 => {
            let v = float()?;
            out.extend_from_slice(&if big { v.to_be_bytes() } else { v.to_le_bytes() });
        }
        FieldKind::C1 => {
            let text = value.to_string();
            out.push(text.bytes().next().unwrap_or(b' '));
        }
        FieldKind::Cn => {
            let text = value.to_string();
            let len = u8::try_from(text.len()).map_err(|_| "string longer than 255 bytes")?;
            out.push(len);
            out.extend_from_slice(text.as_bytes());
        }
        FieldKind::Bn => match value {
            FieldValue::Bytes(bytes) => {
                let len = u8::try_from(bytes.len()).map_err(|_| "more than 255 bytes")?;
                out.push(len);
                out.extend_from_slice(bytes);
            }
            other => return Err(format!("expected bytes, got {:?}", other)),
        },
        FieldKind::Dn => match value {
            FieldValue::Bytes(bytes) => {
                let bits = u16::try_from(bytes.len() * 8).map_err(|_| "bit field too long")?;
                out.extend_from_slice(&if big { bits.to_be_bytes() } else { bits.to_le_bytes() });
                out.extend_from_slice(bytes);
            }
            other => return Err(format!("expected bytes, got {:?}", other)),
        },
    }
    Ok(())
}
