//! Binary container format used by [`FileSample`](super::FileSample).
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! file   := MAGIC version:u16 count:u32 block*
//! block  := name_len:u32 name rank:u8 dtype:u8 width:u32 dim:u64{rank}
//!           [n_lengths:u64 length:i64{n_lengths}]   (rank 2 only)
//!           payload_len:u64 payload
//! ```
//!
//! Rank 0 is a scalar, rank 1 a vector and rank 2 a padded vector-list.
//! Vector-lists are right-padded to their longest row; the original row
//! lengths are kept in the block's length table, with [`ABSENT_ROW`]
//! marking a missing row. Strings are fixed-width, NUL-padded UTF-8.

use std::io::{self, Read, Write};

use crate::error::{Result, SampleError};
use crate::value::{ElementType, Primitive, Shape, Value, Vector, VectorList};

pub(super) const MAGIC: &[u8; 8] = b"CFSAMPLE";
pub(super) const VERSION: u16 = 1;

/// Length recorded for an absent vector-list row.
pub(super) const ABSENT_ROW: i64 = -1;

/// Metadata of one stored block; the payload lives elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct BlockHeader {
    pub shape: Shape,
    pub dtype: ElementType,
    /// Bytes per item.
    pub width: u32,
    pub dims: Vec<u64>,
    pub lengths: Vec<i64>,
}

impl BlockHeader {
    fn item_count(&self) -> Result<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| {
            usize::try_from(d)
                .ok()
                .and_then(|d| acc.checked_mul(d))
                .ok_or_else(|| SampleError::Corrupt(format!("block dimensions {:?} overflow", self.dims)))
        })
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a value into a header and payload.
///
/// Fails before producing anything if the value cannot be stored.
pub(super) fn encode(value: &Value) -> Result<(BlockHeader, Vec<u8>)> {
    match value {
        Value::Scalar(p) => encode_scalar(p),
        Value::Vector(v) => {
            let (width, payload) = encode_items(v)?;
            let header = BlockHeader {
                shape: Shape::Vector,
                dtype: v.element_type(),
                width,
                dims: vec![v.len() as u64],
                lengths: Vec::new(),
            };
            Ok((header, payload))
        }
        Value::VectorList(list) => encode_vector_list(list),
    }
}

fn encode_scalar(p: &Primitive) -> Result<(BlockHeader, Vec<u8>)> {
    let v = match p {
        Primitive::Bool(b) => Vector::Bool(vec![*b]),
        Primitive::Int(i) => Vector::Int(vec![*i]),
        Primitive::Float(x) => Vector::Float(vec![*x]),
        Primitive::Str(s) => Vector::Str(vec![s.clone()]),
    };
    let (width, payload) = encode_items(&v)?;
    let header = BlockHeader {
        shape: Shape::Scalar,
        dtype: p.element_type(),
        width,
        dims: Vec::new(),
        lengths: Vec::new(),
    };
    Ok((header, payload))
}

fn encode_vector_list(list: &VectorList) -> Result<(BlockHeader, Vec<u8>)> {
    let lengths = list.lengths();
    let cols = lengths.iter().copied().max().unwrap_or(0).max(0) as usize;
    let padded = match list {
        VectorList::Bool(rows) => Vector::Bool(pad(rows, cols, false)),
        VectorList::Int(rows) => Vector::Int(pad(rows, cols, 0)),
        VectorList::Float(rows) => Vector::Float(pad(rows, cols, 0.0)),
        VectorList::Str(rows) => Vector::Str(pad(rows, cols, String::new())),
    };
    let (width, payload) = encode_items(&padded)?;
    let header = BlockHeader {
        shape: Shape::VectorList,
        dtype: list.element_type(),
        width,
        dims: vec![list.len() as u64, cols as u64],
        lengths,
    };
    Ok((header, payload))
}

/// Flattens ragged rows into a row-major `rows x cols` buffer.
fn pad<T: Clone>(rows: &[Option<Vec<T>>], cols: usize, fill: T) -> Vec<T> {
    let mut out = Vec::with_capacity(rows.len() * cols);
    for row in rows {
        let row = row.as_deref().unwrap_or(&[]);
        out.extend_from_slice(row);
        out.extend(std::iter::repeat(fill.clone()).take(cols - row.len()));
    }
    out
}

fn encode_items(v: &Vector) -> Result<(u32, Vec<u8>)> {
    Ok(match v {
        Vector::Bool(items) => (1, items.iter().map(|&b| u8::from(b)).collect()),
        Vector::Int(items) => (8, items.iter().flat_map(|i| i.to_le_bytes()).collect()),
        Vector::Float(items) => (8, items.iter().flat_map(|x| x.to_le_bytes()).collect()),
        Vector::Str(items) => encode_strings(items)?,
    })
}

fn encode_strings(items: &[String]) -> Result<(u32, Vec<u8>)> {
    if let Some(bad) = items.iter().find(|s| s.contains('\0')) {
        return Err(SampleError::Unsupported(format!(
            "string {bad:?} contains a NUL byte"
        )));
    }
    let width = items.iter().map(String::len).max().unwrap_or(0);
    let width = u32::try_from(width)
        .map_err(|_| SampleError::Unsupported(format!("string of {width} bytes is too long")))?;
    let mut out = Vec::with_capacity(items.len() * width as usize);
    for s in items {
        out.extend_from_slice(s.as_bytes());
        out.resize(out.len() + width as usize - s.len(), 0);
    }
    Ok((width, out))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes a payload according to its header.
pub(super) fn decode(header: &BlockHeader, payload: &[u8]) -> Result<Value> {
    let count = header.item_count()?;
    let expected = count
        .checked_mul(header.width as usize)
        .ok_or_else(|| SampleError::Corrupt("payload size overflow".to_string()))?;
    if payload.len() != expected {
        return Err(SampleError::Corrupt(format!(
            "payload holds {} bytes, header requires {expected}",
            payload.len()
        )));
    }
    let items = decode_items(header.dtype, header.width, count, payload)?;

    match header.shape {
        Shape::Scalar => {
            let p = match items {
                Vector::Bool(v) => v.into_iter().next().map(Primitive::Bool),
                Vector::Int(v) => v.into_iter().next().map(Primitive::Int),
                Vector::Float(v) => v.into_iter().next().map(Primitive::Float),
                Vector::Str(v) => v.into_iter().next().map(Primitive::Str),
            };
            p.map(Value::Scalar)
                .ok_or_else(|| SampleError::Corrupt("empty scalar block".to_string()))
        }
        Shape::Vector => Ok(Value::Vector(items)),
        Shape::VectorList => {
            let cols = header.dims.get(1).copied().unwrap_or(0) as usize;
            let lengths = &header.lengths;
            Ok(Value::VectorList(match items {
                Vector::Bool(v) => VectorList::Bool(crop(v, cols, lengths)?),
                Vector::Int(v) => VectorList::Int(crop(v, cols, lengths)?),
                Vector::Float(v) => VectorList::Float(crop(v, cols, lengths)?),
                Vector::Str(v) => VectorList::Str(crop(v, cols, lengths)?),
            }))
        }
    }
}

/// Reverses [`pad`]: truncates each row to its recorded length.
fn crop<T: Clone>(flat: Vec<T>, cols: usize, lengths: &[i64]) -> Result<Vec<Option<Vec<T>>>> {
    let mut rows = Vec::with_capacity(lengths.len());
    for (i, &len) in lengths.iter().enumerate() {
        if len == ABSENT_ROW {
            rows.push(None);
            continue;
        }
        let len = usize::try_from(len)
            .ok()
            .filter(|&l| l <= cols)
            .ok_or_else(|| SampleError::Corrupt(format!("row {i} has invalid length {len}")))?;
        let start = i * cols;
        rows.push(Some(flat[start..start + len].to_vec()));
    }
    Ok(rows)
}

fn decode_items(dtype: ElementType, width: u32, count: usize, payload: &[u8]) -> Result<Vector> {
    let fixed = |w: u32| -> Result<()> {
        if width == w {
            Ok(())
        } else {
            Err(SampleError::Corrupt(format!(
                "{dtype} items must be {w} bytes wide, found {width}"
            )))
        }
    };
    match dtype {
        ElementType::Bool => {
            fixed(1)?;
            let items = payload
                .iter()
                .map(|&b| match b {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(SampleError::Corrupt(format!("invalid bool byte {other}"))),
                })
                .collect::<Result<_>>()?;
            Ok(Vector::Bool(items))
        }
        ElementType::Int => {
            fixed(8)?;
            Ok(Vector::Int(
                payload.chunks_exact(8).map(|c| i64::from_le_bytes(word(c))).collect(),
            ))
        }
        ElementType::Float => {
            fixed(8)?;
            Ok(Vector::Float(
                payload.chunks_exact(8).map(|c| f64::from_le_bytes(word(c))).collect(),
            ))
        }
        ElementType::Str => {
            if width == 0 {
                return Ok(Vector::Str(vec![String::new(); count]));
            }
            let items = payload
                .chunks_exact(width as usize)
                .map(|chunk| {
                    let end = chunk.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
                    String::from_utf8(chunk[..end].to_vec())
                        .map_err(|e| SampleError::Corrupt(format!("invalid UTF-8 string: {e}")))
                })
                .collect::<Result<_>>()?;
            Ok(Vector::Str(items))
        }
    }
}

fn word(chunk: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(chunk);
    buf
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

pub(super) fn write_preamble(w: &mut impl Write, block_count: u32) -> io::Result<()> {
    w.write_all(MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&block_count.to_le_bytes())
}

/// Reads the preamble and returns the number of blocks.
pub(super) fn read_preamble(r: &mut impl Read) -> Result<u32> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(SampleError::Corrupt("not a sample container".to_string()));
    }
    let version = u16::from_le_bytes(read_array(r)?);
    if version != VERSION {
        return Err(SampleError::Corrupt(format!(
            "unsupported container version {version}"
        )));
    }
    Ok(u32::from_le_bytes(read_array(r)?))
}

pub(super) fn write_block_header(
    w: &mut impl Write,
    name: &str,
    header: &BlockHeader,
    payload_len: u64,
) -> io::Result<()> {
    w.write_all(&(name.len() as u32).to_le_bytes())?;
    w.write_all(name.as_bytes())?;
    w.write_all(&[rank_code(header.shape), dtype_code(header.dtype)])?;
    w.write_all(&header.width.to_le_bytes())?;
    for d in &header.dims {
        w.write_all(&d.to_le_bytes())?;
    }
    if header.shape == Shape::VectorList {
        w.write_all(&(header.lengths.len() as u64).to_le_bytes())?;
        for len in &header.lengths {
            w.write_all(&len.to_le_bytes())?;
        }
    }
    w.write_all(&payload_len.to_le_bytes())
}

/// Reads one block header, returning its name, header and payload length.
pub(super) fn read_block_header(r: &mut impl Read) -> Result<(String, BlockHeader, u64)> {
    let name_len = u32::from_le_bytes(read_array(r)?) as u64;
    let mut name = Vec::new();
    (&mut *r).take(name_len).read_to_end(&mut name)?;
    if name.len() as u64 != name_len {
        return Err(SampleError::Corrupt("truncated block name".to_string()));
    }
    let name = String::from_utf8(name)
        .map_err(|_| SampleError::Corrupt("block name is not UTF-8".to_string()))?;

    let [rank, dtype] = read_array::<2>(r)?;
    let shape = match rank {
        0 => Shape::Scalar,
        1 => Shape::Vector,
        2 => Shape::VectorList,
        other => return Err(SampleError::Corrupt(format!("invalid rank {other} in `{name}`"))),
    };
    let dtype = match dtype {
        0 => ElementType::Bool,
        1 => ElementType::Int,
        2 => ElementType::Float,
        3 => ElementType::Str,
        other => return Err(SampleError::Corrupt(format!("invalid dtype {other} in `{name}`"))),
    };
    let width = u32::from_le_bytes(read_array(r)?);
    let dims = (0..rank)
        .map(|_| Ok(u64::from_le_bytes(read_array(r)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut lengths = Vec::new();
    if shape == Shape::VectorList {
        let n = u64::from_le_bytes(read_array(r)?);
        if n != dims[0] {
            return Err(SampleError::Corrupt(format!(
                "`{name}` has {} rows but {n} recorded lengths",
                dims[0]
            )));
        }
        for _ in 0..n {
            lengths.push(i64::from_le_bytes(read_array(r)?));
        }
    }

    let payload_len = u64::from_le_bytes(read_array(r)?);
    let header = BlockHeader {
        shape,
        dtype,
        width,
        dims,
        lengths,
    };
    Ok((name, header, payload_len))
}

fn read_array<const N: usize>(r: &mut impl Read) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn rank_code(shape: Shape) -> u8 {
    match shape {
        Shape::Scalar => 0,
        Shape::Vector => 1,
        Shape::VectorList => 2,
    }
}

fn dtype_code(dtype: ElementType) -> u8 {
    match dtype {
        ElementType::Bool => 0,
        ElementType::Int => 1,
        ElementType::Float => 2,
        ElementType::Str => 3,
    }
}
