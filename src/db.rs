//! Binary k-mer database files.
//!
//! Tables are persisted in a compact binary layout so they reload without
//! re-counting:
//!
//! ```text
//! [MAGIC: 4 bytes "KTAB"]
//! [VERSION: u8]
//! [K: u16 little-endian]
//! [STRAND: u8, 0 = single, 1 = canonical]
//! [COUNT: u64 little-endian, number of entries]
//! [ENTRIES: COUNT x (K k-mer bytes + u64 little-endian count)]
//! [CRC32: u32 little-endian, over all preceding bytes]
//! ```
//!
//! Entries are written sorted by k-mer, so identical tables produce
//! identical files. The checksum is verified before any entry is parsed;
//! a truncated or corrupted file is rejected rather than half-loaded.
//! Files ending in `.gz` are compressed when the `gzip` feature is
//! enabled.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use bytes::Bytes;

use crate::{
    count::KmerCountTable,
    error::KtallyError,
    kmer::{Kmer, KmerLength, Strandedness},
};

const MAGIC: &[u8; 4] = b"KTAB";
const VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 2 + 1 + 8;
const CHECKSUM_LEN: usize = 4;

/// CRC32 (IEEE) lookup table, built at compile time.
const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC_TABLE[index];
    }
    !crc
}

/// A writer that computes a CRC32 checksum of everything written through it.
struct Crc32Writer<W: Write> {
    inner: W,
    crc: u32,
}

impl<W: Write> Crc32Writer<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            crc: 0xFFFF_FFFF,
        }
    }

    fn finalize(self) -> (W, u32) {
        (self.inner, !self.crc)
    }
}

impl<W: Write> Write for Crc32Writer<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        for &byte in &buf[..written] {
            let index = ((self.crc ^ u32::from(byte)) & 0xFF) as usize;
            self.crc = (self.crc >> 8) ^ CRC_TABLE[index];
        }
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn strand_byte(strandedness: Strandedness) -> u8 {
    match strandedness {
        Strandedness::Single => 0,
        Strandedness::Canonical => 1,
    }
}

/// Saves a count table to a binary database file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written, or if the
/// table's k exceeds the format limit of [`u16::MAX`].
pub fn save_db<P: AsRef<Path>>(table: &KmerCountTable, path: P) -> Result<(), KtallyError> {
    let path = path.as_ref();
    let k = table.k().get();
    let Ok(k_field) = u16::try_from(k) else {
        return Err(KtallyError::InvalidDb {
            details: format!("k-mer length {k} exceeds the database format limit"),
            path: path.to_path_buf(),
        });
    };

    let file = File::create(path).map_err(|source| KtallyError::DbWrite {
        source,
        path: path.to_path_buf(),
    })?;

    #[cfg(feature = "gzip")]
    if crate::reader::is_gzip_path(path) {
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        return write_db(table, k_field, BufWriter::new(encoder), path);
    }

    write_db(table, k_field, BufWriter::new(file), path)
}

fn write_db<W: Write>(
    table: &KmerCountTable,
    k_field: u16,
    writer: W,
    path: &Path,
) -> Result<(), KtallyError> {
    let io_err = |source| KtallyError::DbWrite {
        source,
        path: path.to_path_buf(),
    };

    let mut entries: Vec<(&Bytes, u64)> = table.iter().collect();
    entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

    let mut writer = Crc32Writer::new(writer);
    writer.write_all(MAGIC).map_err(io_err)?;
    writer.write_all(&[VERSION]).map_err(io_err)?;
    writer.write_all(&k_field.to_le_bytes()).map_err(io_err)?;
    writer
        .write_all(&[strand_byte(table.strandedness())])
        .map_err(io_err)?;
    writer
        .write_all(&(entries.len() as u64).to_le_bytes())
        .map_err(io_err)?;

    for (kmer, count) in entries {
        writer.write_all(kmer).map_err(io_err)?;
        writer.write_all(&count.to_le_bytes()).map_err(io_err)?;
    }

    let (mut inner, checksum) = writer.finalize();
    inner.write_all(&checksum.to_le_bytes()).map_err(io_err)?;
    inner.flush().map_err(io_err)?;
    Ok(())
}

/// Loads a count table from a binary database file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a ktally database,
/// or fails its checksum.
pub fn load_db<P: AsRef<Path>>(path: P) -> Result<KmerCountTable, KtallyError> {
    let path = path.as_ref();
    let read_err = |source| KtallyError::DbRead {
        source,
        path: path.to_path_buf(),
    };

    let mut file = File::open(path).map_err(read_err)?;
    let mut data = Vec::new();

    #[cfg(feature = "gzip")]
    if crate::reader::is_gzip_path(path) {
        flate2::read::GzDecoder::new(file)
            .read_to_end(&mut data)
            .map_err(read_err)?;
        return parse_db(&data, path);
    }

    file.read_to_end(&mut data).map_err(read_err)?;
    parse_db(&data, path)
}

fn parse_db(data: &[u8], path: &Path) -> Result<KmerCountTable, KtallyError> {
    let invalid = |details: String| KtallyError::InvalidDb {
        details,
        path: path.to_path_buf(),
    };

    if data.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(invalid(format!(
            "file too small: {} bytes is below the {} byte minimum",
            data.len(),
            HEADER_LEN + CHECKSUM_LEN
        )));
    }
    if &data[..4] != MAGIC {
        return Err(invalid("not a ktally database".to_owned()));
    }

    let (body, checksum_bytes) = data.split_at(data.len() - CHECKSUM_LEN);
    let stored = u32::from_le_bytes([
        checksum_bytes[0],
        checksum_bytes[1],
        checksum_bytes[2],
        checksum_bytes[3],
    ]);
    let computed = crc32(body);
    if stored != computed {
        return Err(invalid(format!(
            "checksum mismatch: stored {stored:#010x}, computed {computed:#010x}"
        )));
    }

    let version = body[4];
    if version != VERSION {
        return Err(invalid(format!("unsupported version {version}")));
    }

    let k = usize::from(u16::from_le_bytes([body[5], body[6]]));
    let k = KmerLength::new(k).map_err(|_| invalid("k-mer length 0 in header".to_owned()))?;

    let strandedness = match body[7] {
        0 => Strandedness::Single,
        1 => Strandedness::Canonical,
        other => return Err(invalid(format!("unknown strand byte {other:#04x}"))),
    };

    let count = u64::from_le_bytes([
        body[8], body[9], body[10], body[11], body[12], body[13], body[14], body[15],
    ]);
    let entry_len = k.get() + 8;
    let payload = &body[HEADER_LEN..];
    let expected_len = (count as usize).checked_mul(entry_len);
    if expected_len.map_or(true, |len| len != payload.len()) {
        return Err(invalid(format!(
            "payload length {} does not match {count} entries of {entry_len} bytes",
            payload.len()
        )));
    }

    let mut counts: HashMap<Bytes, u64> = HashMap::with_capacity(count as usize);
    for entry in payload.chunks_exact(entry_len) {
        let (kmer_bytes, count_bytes) = entry.split_at(k.get());
        let kmer = Kmer::from_window(Bytes::copy_from_slice(kmer_bytes))
            .map_err(|e| invalid(format!("corrupt entry: {e}")))?;
        let mut le = [0u8; 8];
        le.copy_from_slice(count_bytes);
        let count = u64::from_le_bytes(le);
        if counts.insert(kmer.into_bytes(), count).is_some() {
            return Err(invalid("duplicate k-mer entry".to_owned()));
        }
    }

    Ok(KmerCountTable::new(k, strandedness, counts))
}
