//! STDF V4 binary stream parser
//!
//! Every record starts with a four byte header `REC_LEN:U2 REC_TYP:U1 REC_SUB:U1`
//! followed by `REC_LEN` bytes of body. The first record of a stream is always
//! FAR, whose CPU_TYPE field selects the byte order of every multi-byte field
//! in the file:
//! - CPU_TYPE 1: big-endian (Sun 68k/SPARC)
//! - CPU_TYPE 2: little-endian (x86)
//! - CPU_TYPE 0 (VAX) and anything else is rejected
//!
//! Fields missing at the end of a record body are legal in STDF and decode
//! as `None`. A field cut in half is an error.

use crate::schema::{v4, RecordSchema, SchemaRegistry};
use crate::types::{DecoderError, FieldKind, FieldValue, Record, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::collections::HashSet;
use std::io::{self, Cursor, ErrorKind, Read};
use std::sync::Arc;

/// Byte order of multi-byte fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Byte order declared by the FAR CPU_TYPE field
    pub fn from_cpu_type(cpu_type: u8) -> Result<Self> {
        match cpu_type {
            1 => Ok(Endianness::Big),
            2 => Ok(Endianness::Little),
            other => Err(DecoderError::UnsupportedCpuType(other)),
        }
    }

    fn rec_len(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endianness::Big => u16::from_be_bytes(bytes),
            Endianness::Little => u16::from_le_bytes(bytes),
        }
    }
}

/// Iterator over records of an STDF stream
pub struct StdfRecordIterator<'a, R: Read> {
    reader: R,
    registry: &'a SchemaRegistry,
    source_file: Arc<str>,
    endianness: Endianness,
    /// Byte offset of the next header
    offset: u64,
    next_index: usize,
    pending_far: Option<Record>,
    skipped_types: HashSet<(u8, u8)>,
    finished: bool,
}

impl<'a, R: Read> StdfRecordIterator<'a, R> {
    /// Read the FAR record and prepare to decode the rest of the stream
    pub fn new(mut reader: R, source_name: &str, registry: &'a SchemaRegistry) -> Result<Self> {
        let mut header = [0u8; 4];
        match read_up_to(&mut reader, &mut header)? {
            0 => return Err(DecoderError::MissingFar),
            4 => {}
            _ => {
                return Err(DecoderError::Truncated {
                    record: "FAR".to_string(),
                    offset: 0,
                })
            }
        }
        if (header[2], header[3]) != (v4::FAR.rec_typ, v4::FAR.rec_sub) {
            return Err(DecoderError::MissingFar);
        }

        // The byte order is only known once CPU_TYPE has been read
        let cpu_type = reader.read_u8().map_err(|e| eof_as_truncated(e, "FAR", 0))?;
        let endianness = Endianness::from_cpu_type(cpu_type)?;
        let rec_len = endianness.rec_len([header[0], header[1]]) as usize;
        if rec_len == 0 {
            return Err(DecoderError::InvalidData(
                "FAR record declares an empty body".to_string(),
            ));
        }

        let mut body = vec![0u8; rec_len];
        body[0] = cpu_type;
        reader
            .read_exact(&mut body[1..])
            .map_err(|e| eof_as_truncated(e, "FAR", 0))?;

        log::debug!("STDF byte order: {:?} (CPU_TYPE {})", endianness, cpu_type);

        let source_file: Arc<str> = Arc::from(source_name);
        let far = Record {
            schema: &v4::FAR,
            index: 0,
            source_file: Arc::clone(&source_file),
            values: decode_body(&v4::FAR, &body, endianness, 0)?,
        };

        Ok(Self {
            reader,
            registry,
            source_file,
            endianness,
            offset: 4 + rec_len as u64,
            next_index: 1,
            pending_far: Some(far),
            skipped_types: HashSet::new(),
            finished: false,
        })
    }

    /// Byte order of the stream
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Read records until one with a known schema is found
    fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            let record_offset = self.offset;
            let mut header = [0u8; 4];
            match read_up_to(&mut self.reader, &mut header)? {
                0 => return Ok(None),
                4 => {}
                _ => {
                    return Err(DecoderError::Truncated {
                        record: "header".to_string(),
                        offset: record_offset,
                    })
                }
            }

            let rec_len = self.endianness.rec_len([header[0], header[1]]) as usize;
            let (rec_typ, rec_sub) = (header[2], header[3]);
            let schema = self.registry.get(rec_typ, rec_sub);
            let label = self.record_label(schema, rec_typ, rec_sub);

            let mut body = vec![0u8; rec_len];
            self.reader
                .read_exact(&mut body)
                .map_err(|e| eof_as_truncated(e, &label, record_offset))?;
            self.offset += 4 + rec_len as u64;

            match schema {
                Some(schema) => {
                    let values = decode_body(schema, &body, self.endianness, record_offset)?;
                    let record = Record {
                        schema,
                        index: self.next_index,
                        source_file: Arc::clone(&self.source_file),
                        values,
                    };
                    self.next_index += 1;
                    return Ok(Some(record));
                }
                None => {
                    if self.skipped_types.insert((rec_typ, rec_sub)) {
                        log::warn!(
                            "Skipping {} records (type {}/{}, first at offset {})",
                            label,
                            rec_typ,
                            rec_sub,
                            record_offset
                        );
                    }
                    continue;
                }
            }
        }
    }

    fn record_label(&self, schema: Option<&RecordSchema>, rec_typ: u8, rec_sub: u8) -> String {
        schema
            .map(|s| s.name)
            .or_else(|| self.registry.skipped_name(rec_typ, rec_sub))
            .map(str::to_string)
            .unwrap_or_else(|| format!("unknown {}/{}", rec_typ, rec_sub))
    }
}

impl<'a, R: Read> Iterator for StdfRecordIterator<'a, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(far) = self.pending_far.take() {
            return Some(Ok(far));
        }

        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                // Stream position is unknown after an error
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the reader allows; returns the byte count read
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn eof_as_truncated(err: io::Error, record: &str, offset: u64) -> DecoderError {
    if err.kind() == ErrorKind::UnexpectedEof {
        DecoderError::Truncated {
            record: record.to_string(),
            offset,
        }
    } else {
        DecoderError::IoError(err)
    }
}

/// Decode a record body into schema-ordered values
pub(crate) fn decode_body(
    schema: &RecordSchema,
    body: &[u8],
    endianness: Endianness,
    offset: u64,
) -> Result<Vec<Option<FieldValue>>> {
    let mut cursor = Cursor::new(body);
    let mut values = Vec::with_capacity(schema.fields.len());

    for field in schema.fields {
        if cursor.position() as usize >= body.len() {
            values.push(None);
            continue;
        }
        let value = read_field(&mut cursor, field.kind, endianness)
            .map_err(|e| eof_as_truncated(e, schema.name, offset))?;
        values.push(Some(value));
    }

    let consumed = cursor.position() as usize;
    if consumed < body.len() {
        log::trace!(
            "{} record at offset {} has {} trailing bytes",
            schema.name,
            offset,
            body.len() - consumed
        );
    }

    Ok(values)
}

fn read_field<R: Read>(r: &mut R, kind: FieldKind, e: Endianness) -> io::Result<FieldValue> {
    use Endianness::{Big, Little};

    Ok(match kind {
        FieldKind::U1 | FieldKind::B1 => FieldValue::Unsigned(r.read_u8()? as u64),
        FieldKind::U2 => FieldValue::Unsigned(match e {
            Big => r.read_u16::<BigEndian>()?,
            Little => r.read_u16::<LittleEndian>()?,
        } as u64),
        FieldKind::U4 => FieldValue::Unsigned(match e {
            Big => r.read_u32::<BigEndian>()?,
            Little => r.read_u32::<LittleEndian>()?,
        } as u64),
        FieldKind::I1 => FieldValue::Signed(r.read_i8()? as i64),
        FieldKind::I2 => FieldValue::Signed(match e {
            Big => r.read_i16::<BigEndian>()?,
            Little => r.read_i16::<LittleEndian>()?,
        } as i64),
        FieldKind::I4 => FieldValue::Signed(match e {
            Big => r.read_i32::<BigEndian>()?,
            Little => r.read_i32::<LittleEndian>()?,
        } as i64),
        FieldKind::R4 => FieldValue::Float(match e {
            Big => r.read_f32::<BigEndian>()?,
            Little => r.read_f32::<LittleEndian>()?,
        } as f64),
        FieldKind::R8 => FieldValue::Float(match e {
            Big => r.read_f64::<BigEndian>()?,
            Little => r.read_f64::<LittleEndian>()?,
        }),
        FieldKind::C1 => FieldValue::Text(char::from(r.read_u8()?).to_string()),
        FieldKind::Cn => {
            let len = r.read_u8()? as usize;
            FieldValue::Text(decode_text(read_bytes(r, len)?))
        }
        FieldKind::Bn => {
            let len = r.read_u8()? as usize;
            FieldValue::Bytes(read_bytes(r, len)?)
        }
        FieldKind::Dn => {
            let bits = match e {
                Big => r.read_u16::<BigEndian>()?,
                Little => r.read_u16::<LittleEndian>()?,
            } as usize;
            FieldValue::Bytes(read_bytes(r, bits.div_ceil(8))?)
        }
    })
}

fn read_bytes<R: Read>(r: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// UTF-8 first, Latin-1 otherwise
fn decode_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| b as char).collect())
}
