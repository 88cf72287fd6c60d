//! FIT record stream decoding.
//!
//! Walks the container byte-by-byte: a file header, then interleaved
//! definition and data messages, then a trailing checksum. Length checks
//! happen before every read; decoded session, record and activity messages
//! are pushed into the caller's [`MessageVisitor`], everything else is
//! consumed and dropped.

use chrono::{DateTime, Utc};
use rt_core::{ActivityMessage, MessageVisitor, RecordMessage, SessionMessage};

use crate::FitError;
use crate::crc;

/// Magic bytes at offset 8 of every FIT header.
const SIGNATURE: &[u8; 4] = b".FIT";

/// Shortest legal file header.
const MIN_HEADER_SIZE: usize = 12;

/// Header length that carries its own checksum.
const CHECKSUMMED_HEADER_SIZE: usize = 14;

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
const FIT_EPOCH_OFFSET: i64 = 631_065_600;

/// Record header bits.
const COMPRESSED_HEADER_BIT: u8 = 0x80;
const DEFINITION_BIT: u8 = 0x40;
const DEVELOPER_DATA_BIT: u8 = 0x20;
const LOCAL_TYPE_MASK: u8 = 0x0F;

/// Local message types addressable by a normal record header.
const LOCAL_TYPES: usize = 16;

/// Global message numbers consumed by this decoder.
const MESG_SESSION: u16 = 18;
const MESG_RECORD: u16 = 20;
const MESG_ACTIVITY: u16 = 34;

/// Field definition numbers consumed by this decoder.
mod field_num {
    /// Profile-wide timestamp field.
    pub const TIMESTAMP: u8 = 253;
    pub const RECORD_HEART_RATE: u8 = 3;
    pub const RECORD_DISTANCE: u8 = 5;
    pub const SESSION_START_TIME: u8 = 2;
    pub const SESSION_TOTAL_TIMER_TIME: u8 = 8;
    pub const SESSION_TOTAL_DISTANCE: u8 = 9;
    pub const SESSION_AVG_HEART_RATE: u8 = 16;
}

/// "Field not populated" sentinels for unsigned base types.
const INVALID_U8: u8 = 0xFF;
const INVALID_U32: u32 = 0xFFFF_FFFF;

/// Bounds-checked cursor over the record section.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], FitError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(FitError::Truncated { offset: self.pos })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn byte(&mut self) -> Result<u8, FitError> {
        Ok(self.take(1)?[0])
    }
}

/// One field slot of a definition message.
struct FieldDef {
    number: u8,
    size: u8,
}

/// A definition message: how to decode data messages of one local type.
struct MessageDef {
    global: u16,
    big_endian: bool,
    fields: Vec<FieldDef>,
    /// Total developer-field bytes trailing each data message.
    developer_bytes: usize,
}

impl MessageDef {
    fn parse(reader: &mut Reader<'_>, has_developer: bool) -> Result<Self, FitError> {
        let _reserved = reader.byte()?;
        let big_endian = match reader.byte()? {
            0 => false,
            1 => true,
            raw => return Err(FitError::UnknownArchitecture { raw }),
        };

        let global_bytes = reader.take(2)?;
        let global = if big_endian {
            u16::from_be_bytes([global_bytes[0], global_bytes[1]])
        } else {
            u16::from_le_bytes([global_bytes[0], global_bytes[1]])
        };

        let field_count = reader.byte()?;
        let mut fields = Vec::with_capacity(usize::from(field_count));
        for _ in 0..field_count {
            let def = reader.take(3)?;
            // Byte 2 is the declared base type; values are interpreted by
            // field number and size instead, so it is not retained.
            fields.push(FieldDef {
                number: def[0],
                size: def[1],
            });
        }

        let mut developer_bytes = 0;
        if has_developer {
            let developer_count = reader.byte()?;
            for _ in 0..developer_count {
                let def = reader.take(3)?;
                developer_bytes += usize::from(def[1]);
            }
        }

        Ok(Self {
            global,
            big_endian,
            fields,
            developer_bytes,
        })
    }
}

/// Decodes a complete FIT file and pushes its messages into `visitor`.
///
/// The signature and both checksums are verified before and during the
/// walk; `on_complete` fires only when the whole record section decoded
/// cleanly.
pub(crate) fn decode<V: MessageVisitor>(data: &[u8], visitor: &mut V) -> Result<(), FitError> {
    let header = FileHeader::parse(data)?;

    let body_end = header
        .size
        .checked_add(header.data_size)
        .filter(|&end| end + 2 <= data.len())
        .ok_or(FitError::Truncated { offset: data.len() })?;

    let stored = u16::from_le_bytes([data[body_end], data[body_end + 1]]);
    let computed = crc::checksum(&data[..body_end]);
    if stored != computed {
        return Err(FitError::CrcMismatch { stored, computed });
    }

    let mut definitions: [Option<MessageDef>; LOCAL_TYPES] = std::array::from_fn(|_| None);
    let mut last_timestamp: Option<u32> = None;
    let mut reader = Reader::new(&data[header.size..body_end]);

    while reader.remaining() > 0 {
        let record_header = reader.byte()?;

        if record_header & COMPRESSED_HEADER_BIT != 0 {
            // Compressed timestamp header: two-bit local type, five-bit
            // rollover offset against the last absolute timestamp.
            let local = (record_header >> 5) & 0x03;
            let offset = record_header & 0x1F;
            let definition = definitions[usize::from(local)]
                .as_ref()
                .ok_or(FitError::UndefinedLocalType { local })?;

            let header_timestamp = if let Some(previous) = last_timestamp {
                Some(advance_compressed(previous, offset))
            } else {
                tracing::warn!(local, "compressed timestamp with no preceding absolute timestamp");
                None
            };
            decode_data(
                definition,
                &mut reader,
                header_timestamp,
                &mut last_timestamp,
                visitor,
            )?;
        } else if record_header & DEFINITION_BIT != 0 {
            let local = usize::from(record_header & LOCAL_TYPE_MASK);
            let has_developer = record_header & DEVELOPER_DATA_BIT != 0;
            definitions[local] = Some(MessageDef::parse(&mut reader, has_developer)?);
        } else {
            let local = record_header & LOCAL_TYPE_MASK;
            let definition = definitions[usize::from(local)]
                .as_ref()
                .ok_or(FitError::UndefinedLocalType { local })?;
            decode_data(definition, &mut reader, None, &mut last_timestamp, visitor)?;
        }
    }

    visitor.on_complete();
    Ok(())
}

struct FileHeader {
    size: usize,
    data_size: usize,
}

impl FileHeader {
    fn parse(data: &[u8]) -> Result<Self, FitError> {
        if data.len() < MIN_HEADER_SIZE || &data[8..12] != SIGNATURE {
            return Err(FitError::InvalidSignature);
        }

        let size = usize::from(data[0]);
        if size < MIN_HEADER_SIZE {
            return Err(FitError::InvalidSignature);
        }
        if data.len() < size {
            return Err(FitError::Truncated { offset: data.len() });
        }

        if size >= CHECKSUMMED_HEADER_SIZE {
            let stored = u16::from_le_bytes([data[12], data[13]]);
            // A zero header checksum means "not set".
            if stored != 0 {
                let computed = crc::checksum(&data[..12]);
                if stored != computed {
                    return Err(FitError::CrcMismatch { stored, computed });
                }
            }
        }

        let data_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        Ok(Self { size, data_size })
    }
}

/// Decodes one data message against its definition.
///
/// All declared fields are consumed from the reader; only the fields this
/// decoder understands contribute to the visited message. Timestamps are
/// tracked across every message kind so compressed headers can continue
/// from them.
fn decode_data<V: MessageVisitor>(
    definition: &MessageDef,
    reader: &mut Reader<'_>,
    header_timestamp: Option<u32>,
    last_timestamp: &mut Option<u32>,
    visitor: &mut V,
) -> Result<(), FitError> {
    let mut timestamp = header_timestamp;
    let mut distance_raw: Option<u32> = None;
    let mut heart_rate: Option<u8> = None;
    let mut start_time_raw: Option<u32> = None;
    let mut timer_time_raw: Option<u32> = None;
    let mut avg_heart_rate: Option<u8> = None;

    for field in &definition.fields {
        let bytes = reader.take(usize::from(field.size))?;
        match (definition.global, field.number) {
            (_, field_num::TIMESTAMP) => timestamp = field_u32(bytes, definition.big_endian),
            (MESG_RECORD, field_num::RECORD_DISTANCE)
            | (MESG_SESSION, field_num::SESSION_TOTAL_DISTANCE) => {
                distance_raw = field_u32(bytes, definition.big_endian);
            }
            (MESG_RECORD, field_num::RECORD_HEART_RATE) => heart_rate = field_u8(bytes),
            (MESG_SESSION, field_num::SESSION_START_TIME) => {
                start_time_raw = field_u32(bytes, definition.big_endian);
            }
            (MESG_SESSION, field_num::SESSION_TOTAL_TIMER_TIME) => {
                timer_time_raw = field_u32(bytes, definition.big_endian);
            }
            (MESG_SESSION, field_num::SESSION_AVG_HEART_RATE) => {
                avg_heart_rate = field_u8(bytes);
            }
            _ => {}
        }
    }
    reader.take(definition.developer_bytes)?;

    if timestamp.is_some() {
        *last_timestamp = timestamp;
    }

    match definition.global {
        MESG_RECORD => visitor.visit_record(RecordMessage {
            timestamp: timestamp.and_then(fit_timestamp),
            // Distance is centimeters on the wire.
            distance_m: distance_raw.map(|raw| f64::from(raw) / 100.0),
            heart_rate,
        }),
        MESG_SESSION => visitor.visit_session(SessionMessage {
            start_time: start_time_raw.and_then(fit_timestamp),
            // Timer time is milliseconds on the wire.
            total_timer_time_s: timer_time_raw.map(|raw| f64::from(raw) / 1000.0),
            total_distance_m: distance_raw.map(|raw| f64::from(raw) / 100.0),
            avg_heart_rate,
        }),
        MESG_ACTIVITY => visitor.visit_activity(ActivityMessage {
            timestamp: timestamp.and_then(fit_timestamp),
        }),
        _ => {}
    }

    Ok(())
}

/// Applies a five-bit compressed timestamp offset, rolling over when the
/// offset wrapped past the previous value.
const fn advance_compressed(previous: u32, offset: u8) -> u32 {
    let candidate = (previous & !0x1F) | offset as u32;
    if candidate >= previous {
        candidate
    } else {
        candidate + 0x20
    }
}

/// Reads an unsigned 32-bit field, treating the all-ones sentinel and any
/// unexpected width as "not populated".
fn field_u32(bytes: &[u8], big_endian: bool) -> Option<u32> {
    let array: [u8; 4] = bytes.try_into().ok()?;
    let raw = if big_endian {
        u32::from_be_bytes(array)
    } else {
        u32::from_le_bytes(array)
    };
    (raw != INVALID_U32).then_some(raw)
}

/// Reads an unsigned 8-bit field, treating the all-ones sentinel and any
/// unexpected width as "not populated".
fn field_u8(bytes: &[u8]) -> Option<u8> {
    match bytes {
        &[raw] if raw != INVALID_U8 => Some(raw),
        _ => None,
    }
}

/// Converts seconds since the FIT epoch to UTC.
fn fit_timestamp(raw: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(FIT_EPOCH_OFFSET + i64::from(raw), 0)
}
