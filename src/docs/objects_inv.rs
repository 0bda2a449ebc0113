//! Decoder for Sphinx `objects.inv` inventories (versions 1 and 2).

use crate::error::{Error, Result};
use crate::models::InventoryRecord;
use flate2::read::ZlibDecoder;
use regex::Regex;
use reqwest::Url;
use std::collections::HashMap;
use std::io::Read;
use std::sync::LazyLock;

pub const INVENTORY_FILE: &str = "objects.inv";

const HEADER_V1: &str = "# Sphinx inventory version 1";
const HEADER_V2: &str = "# Sphinx inventory version 2";
const PROJECT_PREFIX: &str = "# Project: ";
const VERSION_PREFIX: &str = "# Version: ";

// name, domain:role, priority, location, display name; names may contain spaces
static ENTRY_V2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+(\S+)\s+(-?\d+)\s+?(\S*)\s+(.*)$").expect("valid inventory regex")
});

/// Decode a raw inventory downloaded from `inventory_url`.
///
/// Relative locations are resolved against the directory the inventory lives
/// in.
pub fn parse(raw: &[u8], inventory_url: &str) -> Result<Vec<InventoryRecord>> {
    let base = base_url(inventory_url);
    let base = base.as_ref();
    let mut reader = HeaderReader::new(raw);

    let header = reader.line()?;
    match header.trim_end() {
        HEADER_V2 => parse_v2(reader, base),
        HEADER_V1 => parse_v1(reader, base),
        other => Err(Error::Parse(format!(
            "Unknown or unsupported inventory version: {other:?}"
        ))),
    }
}

fn parse_v2(mut reader: HeaderReader<'_>, base: Option<&Url>) -> Result<Vec<InventoryRecord>> {
    let project_name = strip_header(&reader.line()?, PROJECT_PREFIX);
    let project_version = strip_header(&reader.line()?, VERSION_PREFIX);
    let compression = reader.line()?;
    if !compression.contains("zlib") {
        return Err(Error::Parse(format!(
            "invalid inventory header (not compressed): {}",
            compression.trim_end()
        )));
    }

    let mut body = String::new();
    ZlibDecoder::new(reader.rest())
        .read_to_string(&mut body)
        .map_err(|e| Error::Parse(format!("failed to decompress inventory: {e}")))?;

    let mut builder = InventoryBuilder::default();
    for line in body.lines() {
        let Some(caps) = ENTRY_V2.captures(line.trim_end()) else {
            continue;
        };
        let name = &caps[1];
        let domain_role = &caps[2];
        let mut location = caps[4].to_string();
        let display_name = &caps[5];

        // entries without a domain are from broken generators
        if !domain_role.contains(':') {
            continue;
        }
        // old Sphinx wrote modules twice
        if domain_role == "py:module" && builder.contains(domain_role, name) {
            continue;
        }
        if location.ends_with('$') {
            location.pop();
            location.push_str(name);
        }

        builder.insert(InventoryRecord {
            domain_role: domain_role.to_string(),
            fullname: name.to_string(),
            display_name: display_name.to_string(),
            project_name: project_name.clone(),
            project_version: project_version.clone(),
            uri: resolve(base, &location),
        });
    }

    Ok(builder.finish())
}

fn parse_v1(mut reader: HeaderReader<'_>, base: Option<&Url>) -> Result<Vec<InventoryRecord>> {
    let project_name = strip_header(&reader.line()?, PROJECT_PREFIX);
    let project_version = strip_header(&reader.line()?, VERSION_PREFIX);
    let body = std::str::from_utf8(reader.rest())
        .map_err(|e| Error::Parse(format!("inventory is not valid UTF-8: {e}")))?;

    let mut builder = InventoryBuilder::default();
    for line in body.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(kind)) = (parts.next(), parts.next()) else {
            continue;
        };
        let location = parts.collect::<Vec<_>>().join(" ");
        if location.is_empty() {
            continue;
        }
        let location = resolve(base, &location);
        let (domain_role, uri) = if kind == "mod" {
            ("py:module".to_string(), format!("{location}#module-{name}"))
        } else {
            (format!("py:{kind}"), format!("{location}#{name}"))
        };

        builder.insert(InventoryRecord {
            domain_role,
            fullname: name.to_string(),
            display_name: "-".to_string(),
            project_name: project_name.clone(),
            project_version: project_version.clone(),
            uri,
        });
    }

    Ok(builder.finish())
}

/// The URL of the directory holding `objects.inv`, or `None` when the
/// inventory location is not an absolute URL
pub fn base_url(inventory_url: &str) -> Option<Url> {
    Url::parse(inventory_url.trim())
        .and_then(|url| url.join("./"))
        .ok()
}

/// Resolve an inventory location against the inventory's directory
fn resolve(base: Option<&Url>, location: &str) -> String {
    match base.map(|base| base.join(location)) {
        Some(Ok(url)) => url.to_string(),
        _ => location.to_string(),
    }
}

fn strip_header(line: &str, prefix: &str) -> String {
    line.trim_end()
        .strip_prefix(prefix)
        .unwrap_or_default()
        .to_string()
}

/// Reads newline-terminated header lines off the front of the raw bytes
struct HeaderReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn line(&mut self) -> Result<String> {
        let remaining = &self.data[self.pos..];
        let end = remaining
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| Error::Parse("truncated inventory header".to_string()))?;
        self.pos += end + 1;
        String::from_utf8(remaining[..end].to_vec())
            .map_err(|e| Error::Parse(format!("inventory header is not valid UTF-8: {e}")))
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

/// Collects entries grouped by role in first-seen order; a repeated
/// `(role, name)` replaces the earlier entry in place.
#[derive(Default)]
struct InventoryBuilder {
    groups: Vec<Vec<InventoryRecord>>,
    group_index: HashMap<String, usize>,
    entry_index: HashMap<(usize, String), usize>,
}

impl InventoryBuilder {
    fn contains(&self, domain_role: &str, name: &str) -> bool {
        self.group_index
            .get(domain_role)
            .is_some_and(|&g| self.entry_index.contains_key(&(g, name.to_string())))
    }

    fn insert(&mut self, record: InventoryRecord) {
        let group = match self.group_index.get(&record.domain_role) {
            Some(&g) => g,
            None => {
                self.groups.push(Vec::new());
                let g = self.groups.len() - 1;
                self.group_index.insert(record.domain_role.clone(), g);
                g
            }
        };

        let key = (group, record.fullname.clone());
        match self.entry_index.get(&key) {
            Some(&i) => self.groups[group][i] = record,
            None => {
                self.entry_index.insert(key, self.groups[group].len());
                self.groups[group].push(record);
            }
        }
    }

    fn finish(self) -> Vec<InventoryRecord> {
        self.groups.into_iter().flatten().collect()
    }
}
