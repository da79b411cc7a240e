//! Persisted statistics image
//!
//! Written by `flush` after a rebuild:
//!
//! ```text
//! "XSK1" | meta | tag names | attribute names | skeleton
//! meta:  num size | num height | u8 dirty
//! names: num count | per name: bytes key | num count | num len | u8 kind [| min | max]
//! ```

use super::meta::MetaData;
use super::name_stats::ValueKind;
use super::names::Names;
use crate::codec::{write_bytes, write_num, ByteReader};
use crate::error::{Result, StatsError};
use crate::skel::Skeleton;

const MAGIC: &[u8; 4] = b"XSK1";

/// Statistics of one name as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NameEntry {
    pub name: Vec<u8>,
    pub count: u32,
    pub len: u64,
    pub kind: ValueKind,
    /// Numeric range for numeric kinds
    pub range: Option<(f64, f64)>,
}

/// Decoded statistics image
#[derive(Debug, Clone)]
pub struct StatsImage {
    pub meta: MetaData,
    pub tags: Vec<NameEntry>,
    pub atts: Vec<NameEntry>,
    pub skeleton: Skeleton,
}

impl StatsImage {
    pub fn encode(meta: &MetaData, tags: &Names, atts: &Names, skeleton: &Skeleton) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + skeleton.len() * 8);
        out.extend_from_slice(MAGIC);
        write_num(&mut out, u64::from(meta.size));
        write_num(&mut out, u64::from(meta.height));
        out.push(u8::from(meta.dirty));
        write_names(&mut out, tags);
        write_names(&mut out, atts);
        skeleton.write(&mut out);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<StatsImage> {
        let mut reader = ByteReader::new(bytes);
        for &expected in MAGIC {
            if reader.read_u8()? != expected {
                return Err(StatsError::Decode("bad statistics image header".into()));
            }
        }
        let meta = MetaData {
            size: reader.read_num_u32()?,
            height: reader.read_num_u32()?,
            dirty: reader.read_u8()? != 0,
        };
        let tags = read_names(&mut reader)?;
        let atts = read_names(&mut reader)?;
        let skeleton = Skeleton::read(&mut reader)?;
        if !reader.is_at_end() {
            return Err(StatsError::Decode("trailing bytes after statistics image".into()));
        }
        Ok(StatsImage {
            meta,
            tags,
            atts,
            skeleton,
        })
    }
}

fn kind_code(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::None => 0,
        ValueKind::Integer => 1,
        ValueKind::Double => 2,
        ValueKind::Category => 3,
        ValueKind::Text => 4,
    }
}

fn kind_from_code(code: u8) -> Result<ValueKind> {
    match code {
        0 => Ok(ValueKind::None),
        1 => Ok(ValueKind::Integer),
        2 => Ok(ValueKind::Double),
        3 => Ok(ValueKind::Category),
        4 => Ok(ValueKind::Text),
        _ => Err(StatsError::Decode(format!("invalid value kind {}", code))),
    }
}

fn write_names(out: &mut Vec<u8>, names: &Names) {
    write_num(out, names.len() as u64);
    for (_, key, stats) in names.iter() {
        write_bytes(out, key);
        write_num(out, u64::from(stats.count));
        write_num(out, stats.len);
        out.push(kind_code(stats.kind));
        if let Some((min, max)) = stats.range() {
            write_num(out, min.to_bits());
            write_num(out, max.to_bits());
        }
    }
}

fn read_names(reader: &mut ByteReader<'_>) -> Result<Vec<NameEntry>> {
    let n = reader.read_num()? as usize;
    // Cap the preallocation; a corrupt count fails on read instead
    let mut entries = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        let name = reader.read_bytes()?.to_vec();
        let count = reader.read_num_u32()?;
        let len = reader.read_num()?;
        let kind = kind_from_code(reader.read_u8()?)?;
        let range = match kind {
            ValueKind::Integer | ValueKind::Double => Some((
                f64::from_bits(reader.read_num()?),
                f64::from_bits(reader.read_num()?),
            )),
            _ => None,
        };
        entries.push(NameEntry {
            name,
            count,
            len,
            kind,
            range,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NodeKind;
    use crate::skel::SkelId;

    #[test]
    fn test_encode_decode() {
        let mut tags = Names::default();
        let mut atts = Names::default();
        let root = tags.index(b"root", None).unwrap();
        atts.index(b"n", Some(b"5")).unwrap();
        atts.index(b"n", Some(b"-1")).unwrap();

        let mut skel = Skeleton::new();
        skel.enter(SkelId::ROOT, root, NodeKind::Element);

        let meta = MetaData {
            size: 3,
            height: 1,
            dirty: false,
        };
        let bytes = StatsImage::encode(&meta, &tags, &atts, &skel);
        let image = StatsImage::decode(&bytes).unwrap();

        assert_eq!(image.meta, meta);
        assert_eq!(image.tags[0].name, b"root");
        assert_eq!(image.tags[0].count, 1);
        assert_eq!(image.atts[0].kind, ValueKind::Integer);
        assert_eq!(image.atts[0].range, Some((-1.0, 5.0)));
        assert_eq!(image.skeleton.len(), 1);
    }

    #[test]
    fn test_bad_header() {
        assert!(StatsImage::decode(b"NOPE").is_err());
        assert!(StatsImage::decode(b"").is_err());
    }
}
