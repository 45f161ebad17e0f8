use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

/// Named-resource container queried by exact file name.
///
/// Lookups are case-sensitive and include the extension. A missing file is
/// not an error: callers decide whether absence matters.
pub trait ResourceArchive: Send + Sync {
    /// Name used to identify the archive in logs and caches.
    fn label(&self) -> &str;

    fn find_file_data(&self, name: &str) -> Option<Arc<[u8]>>;
}

impl<T> ResourceArchive for Arc<T>
where
    T: ResourceArchive + ?Sized,
{
    fn label(&self) -> &str {
        (**self).label()
    }

    fn find_file_data(&self, name: &str) -> Option<Arc<[u8]>> {
        (**self).find_file_data(name)
    }
}

/// Archive whose files live in a plain map. Handy for hosts that already
/// decoded their containers, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    label: String,
    files: HashMap<String, Arc<[u8]>>,
}

impl MemoryArchive {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.files.insert(name.into(), Arc::from(data.into_boxed_slice()));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ResourceArchive for MemoryArchive {
    fn label(&self) -> &str {
        &self.label
    }

    fn find_file_data(&self, name: &str) -> Option<Arc<[u8]>> {
        self.files.get(name).cloned()
    }
}

/// File entry extracted from a packed archive's table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedEntry {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

/// In-memory representation of a `.larc` stage pack.
///
/// Layout (little endian): `LARC`, `u32` version, `u32` entry count, then
/// for every entry a `u32` name length, the UTF-8 name, a `u32` size and
/// the file bytes.
#[derive(Debug, Clone)]
pub struct PackedArchive {
    label: String,
    version: u32,
    entries: Vec<PackedEntry>,
    data: Arc<[u8]>,
}

const PACKED_MAGIC: &[u8; 4] = b"LARC";

impl PackedArchive {
    /// Opens a pack from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file =
            File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .context("unable to read archive into memory")?;
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(label, data)
    }

    /// Creates a pack from bytes already resident in memory.
    pub fn from_bytes(label: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let data: Arc<[u8]> = Arc::from(data.into_boxed_slice());
        let (version, entries) = parse_packed(&data)?;
        Ok(Self {
            label: label.into(),
            version,
            entries,
            data,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries(&self) -> &[PackedEntry] {
        &self.entries
    }

    /// Names of the top-level directories inside the pack, in entry order.
    pub fn directories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if let Some((dir, _)) = entry.name.split_once('/') {
                if !seen.iter().any(|known: &String| known == dir) {
                    seen.push(dir.to_string());
                }
            }
        }
        seen
    }
}

impl ResourceArchive for PackedArchive {
    fn label(&self) -> &str {
        &self.label
    }

    fn find_file_data(&self, name: &str) -> Option<Arc<[u8]>> {
        let entry = self.entries.iter().find(|entry| entry.name == name)?;
        Some(Arc::from(&self.data[entry.offset..entry.offset + entry.size]))
    }
}

fn parse_packed(data: &[u8]) -> Result<(u32, Vec<PackedEntry>)> {
    if data.len() < 12 {
        return Err(anyhow!(
            "archive too small to contain header (len={})",
            data.len()
        ));
    }
    let magic = &data[..4];
    if magic != PACKED_MAGIC {
        return Err(anyhow!(
            "invalid archive magic: expected LARC, found {:?}",
            magic
        ));
    }

    let mut cursor = 4;
    let version = read_u32(data, &mut cursor)?;
    let count = read_u32(data, &mut cursor)?;
    let mut entries = Vec::with_capacity(count.min(4096) as usize);

    for _ in 0..count {
        let name_len = read_u32(data, &mut cursor)? as usize;
        let name_bytes = take(data, &mut cursor, name_len)
            .context("archive file name extends past end of data")?;
        let name = String::from_utf8(name_bytes.to_vec())
            .map_err(|err| anyhow!("invalid UTF-8 in file name: {err}"))?;
        let size = read_u32(data, &mut cursor)? as usize;
        let offset = cursor;
        take(data, &mut cursor, size).with_context(|| {
            format!("file entry {name} points outside archive bounds (size={size})")
        })?;
        entries.push(PackedEntry { name, offset, size });
    }

    if cursor != data.len() {
        return Err(anyhow!(
            "archive parsing ended at {cursor}, expected {}",
            data.len()
        ));
    }
    Ok((version, entries))
}

fn take<'a>(data: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = cursor
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| anyhow!("unexpected end of archive at {}", *cursor))?;
    let slice = &data[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn read_u32(data: &[u8], cursor: &mut usize) -> Result<u32> {
    let bytes = take(data, cursor, 4).context("unexpected end of archive while reading 32-bit value")?;
    let mut value = [0u8; 4];
    value.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(value))
}

/// View over the files stored under `<prefix>/` of another archive.
///
/// Stage packs keep one object archive per directory; a sub-archive lets an
/// actor query `Wait.bck` rather than `Kuribo/Wait.bck`.
#[derive(Clone)]
pub struct SubArchive {
    parent: Arc<dyn ResourceArchive>,
    prefix: String,
}

impl SubArchive {
    pub fn new(parent: Arc<dyn ResourceArchive>, prefix: impl Into<String>) -> Self {
        Self {
            parent,
            prefix: prefix.into(),
        }
    }
}

impl std::fmt::Debug for SubArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubArchive")
            .field("parent", &self.parent.label())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl ResourceArchive for SubArchive {
    fn label(&self) -> &str {
        &self.prefix
    }

    fn find_file_data(&self, name: &str) -> Option<Arc<[u8]>> {
        self.parent
            .find_file_data(&format!("{}/{}", self.prefix, name))
    }
}

#[cfg(test)]
pub(crate) fn build_packed(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(PACKED_MAGIC);
    buffer.extend_from_slice(&1u32.to_le_bytes());
    buffer.extend_from_slice(&(files.len() as u32).to_le_bytes());
    for (name, data) in files {
        buffer.extend_from_slice(&(name.len() as u32).to_le_bytes());
        buffer.extend_from_slice(name.as_bytes());
        buffer.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buffer.extend_from_slice(data);
    }
    buffer
}
