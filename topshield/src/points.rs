//! GeoJSON point store.

use anyhow::{anyhow, bail, Result};
use geo::geometry::Coord;
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, JsonValue, Value};
use log::warn;
use serde::Serialize;
use shielding::{Crs, SampleId, SamplePoint, Shielding};
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

/// Which feature properties hold sample attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fields<'a> {
    pub strike: Option<&'a str>,
    pub dip: Option<&'a str>,
    pub height: Option<&'a str>,
    pub id: Option<&'a str>,
}

/// A feature that could not be turned into a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unresolved {
    pub id: SampleId,
    pub reason: String,
}

pub struct PointStore {
    collection: FeatureCollection,
}

impl PointStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let collection = FeatureCollection::try_from(GeoJson::from_reader(rdr)?)?;
        Ok(Self { collection })
    }

    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    /// Returns the CRS named by the collection's legacy `crs` member,
    /// if any.
    pub fn crs(&self) -> Option<Crs> {
        let name = self
            .collection
            .foreign_members
            .as_ref()?
            .get("crs")?
            .pointer("/properties/name")?
            .as_str()?;
        name.parse().ok()
    }

    /// Returns a sample for every feature that can be resolved into
    /// one, and the features that can't.
    ///
    /// Features without a point geometry or with unreadable
    /// attributes are unresolved.
    pub fn samples(&self, fields: &Fields) -> Result<(Vec<SamplePoint>, Vec<Unresolved>)> {
        let mut seen = HashSet::new();
        let mut samples = Vec::with_capacity(self.len());
        let mut unresolved = Vec::new();
        for (idx, feature) in self.collection.features.iter().enumerate() {
            let id = sample_id(idx, feature, fields.id);
            if !seen.insert(id.clone()) {
                bail!("duplicate sample id {id}");
            }
            match to_sample(id.clone(), feature, fields) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    warn!("skipping feature {idx} ({id}): {e}");
                    unresolved.push(Unresolved {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok((samples, unresolved))
    }

    /// Sets `field` on every feature with a result, and removes it
    /// from every other feature.
    pub fn update(
        &mut self,
        field: &str,
        id_field: Option<&str>,
        results: &HashMap<SampleId, Shielding>,
    ) {
        for (idx, feature) in self.collection.features.iter_mut().enumerate() {
            let id = sample_id(idx, feature, id_field);
            match results.get(&id) {
                Some(shielding) => feature.set_property(field, shielding.factor),
                None => {
                    if let Some(properties) = feature.properties.as_mut() {
                        properties.remove(field);
                    }
                }
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut wtr = BufWriter::new(File::create(path)?);
        self.write_to(&mut wtr)?;
        wtr.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, wtr: W) -> Result<()> {
        serde_json::to_writer(wtr, &self.collection)?;
        Ok(())
    }
}

fn sample_id(idx: usize, feature: &Feature, id_field: Option<&str>) -> SampleId {
    let from_field = id_field
        .and_then(|field| feature.property(field))
        .and_then(|value| match value {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        });
    let from_feature = || match &feature.id {
        Some(Id::String(s)) => Some(s.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => None,
    };
    SampleId(
        from_field
            .or_else(from_feature)
            .unwrap_or_else(|| idx.to_string()),
    )
}

fn to_sample(id: SampleId, feature: &Feature, fields: &Fields) -> Result<SamplePoint> {
    let position = match feature.geometry.as_ref().map(|geometry| &geometry.value) {
        Some(Value::Point(position)) if position.len() >= 2 => Coord {
            x: position[0],
            y: position[1],
        },
        _ => bail!("not a point"),
    };
    let mut sample = SamplePoint::new(id, position);
    sample.strike = number(feature, fields.strike)?;
    sample.dip = number(feature, fields.dip)?;
    sample.height = number(feature, fields.height)?;
    Ok(sample)
}

/// Reads an optional numeric property; missing and null values are
/// `None`.
fn number(feature: &Feature, field: Option<&str>) -> Result<Option<f64>> {
    let Some(field) = field else {
        return Ok(None);
    };
    match feature.property(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(n.as_f64()),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{field} is not a number: {s:?}")),
        Some(other) => bail!("{field} is not a number: {other}"),
    }
}
