//! Directory dump
//!
//! Walks every region and its stations and writes
//! `{"<region id>": {"title": ..., "radios": [...]}, ...}` as UTF-8 JSON:
//! four-space indentation, no space after `:`, non-ASCII left unescaped,
//! regions in upstream order.

use qtfm_common::directory::Station;
use qtfm_common::{Region, RegionId, Result, StationDirectory};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io;
use std::path::Path;
use tracing::info;

/// One region in the dump
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegionEntry {
    pub title: String,
    pub radios: Vec<Station>,
}

/// Every region with its stations, in upstream order
#[derive(Debug, Clone, Default)]
pub struct DirectoryDump {
    pub regions: Vec<(RegionId, RegionEntry)>,
}

impl DirectoryDump {
    pub fn station_count(&self) -> usize {
        self.regions.iter().map(|(_, entry)| entry.radios.len()).sum()
    }
}

impl Serialize for DirectoryDump {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.regions.len()))?;
        for (id, entry) in &self.regions {
            map.serialize_entry(&id.to_string(), entry)?;
        }
        map.end()
    }
}

/// Fetch all regions, then each region's stations one at a time
pub async fn fetch_directory(directory: &dyn StationDirectory) -> Result<DirectoryDump> {
    info!("Fetching regions...");
    let regions = directory.regions().await?;

    let mut dump = DirectoryDump::default();
    for object in &regions {
        let region = Region::from_object(object)?;
        info!("Fetching radios for {}...", region.title);
        let radios = directory.stations(region.id).await?;
        dump.regions.push((
            region.id,
            RegionEntry {
                title: region.title,
                radios,
            },
        ));
    }

    Ok(dump)
}

/// Pretty printer with a bare `:` between key and value
struct DumpFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl<'a> DumpFormatter<'a> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl<'a> Formatter for DumpFormatter<'a> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b":")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }
}

/// Render any serializable value in the dump layout
pub fn to_dump_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, DumpFormatter::new());
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write the dump to `path`, replacing any existing file
pub async fn write_dump(path: &Path, dump: &DirectoryDump) -> Result<()> {
    let json = to_dump_json(dump)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
