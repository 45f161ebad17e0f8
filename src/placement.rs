use anyhow::{anyhow, Context, Result};
use glam::{EulerRot, Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Scenario layer an actor is placed on. `Common` actors exist in every
/// scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LayerId {
    #[default]
    Common,
    /// Layers `A` (0) to `P` (15).
    Layer(u8),
}

impl LayerId {
    pub const MAX: u8 = 15;

    pub fn parse(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("common") {
            return Ok(LayerId::Common);
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_alphabetic() => {
                let index = letter.to_ascii_uppercase() as u8 - b'A';
                if index <= Self::MAX {
                    Ok(LayerId::Layer(index))
                } else {
                    Err(anyhow!("layer {value} is out of range (A-P)"))
                }
            }
            _ => Err(anyhow!("invalid layer {value:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneAndLayer {
    pub zone_id: i32,
    pub layer_id: LayerId,
}

impl ZoneAndLayer {
    /// Placement used for actors spawned at runtime rather than from data.
    pub const DYNAMIC_SPAWN: ZoneAndLayer = ZoneAndLayer {
        zone_id: -1,
        layer_id: LayerId::Common,
    };
}

impl Default for ZoneAndLayer {
    fn default() -> Self {
        Self {
            zone_id: 0,
            layer_id: LayerId::Common,
        }
    }
}

/// Decides which zones and layers are active in the current scenario.
pub trait ScenarioSwitch {
    fn check_alive_scenario(&self, zone_and_layer: ZoneAndLayer) -> bool;
}

/// Scenario where only the listed layers (plus `Common`) are alive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerMask {
    pub layers: Vec<u8>,
}

impl ScenarioSwitch for LayerMask {
    fn check_alive_scenario(&self, zone_and_layer: ZoneAndLayer) -> bool {
        match zone_and_layer.layer_id {
            LayerId::Common => true,
            LayerId::Layer(index) => self.layers.contains(&index),
        }
    }
}

/// Stage placement data: zones and the actors placed in them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Placement {
    pub zones: Vec<ZonePlacement>,
    pub actors: Vec<PlacementInfo>,
}

/// Where a zone sits inside the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePlacement {
    pub id: i32,
    #[serde(default)]
    pub position: Vec3,
    /// Degrees.
    #[serde(default)]
    pub rotation: Vec3,
}

impl ZonePlacement {
    pub fn matrix(&self) -> Mat4 {
        make_mtx_srt(Vec3::ONE, radians(self.rotation), self.position)
    }
}

/// One placed actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementInfo {
    pub name: String,
    /// Object archive to load; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    #[serde(default)]
    pub position: Vec3,
    /// Degrees, applied Z * Y * X.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default)]
    pub zone_and_layer: ZoneAndLayer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Action started right after the actor is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Default for PlacementInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            archive: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            zone_and_layer: ZoneAndLayer::default(),
            radius: None,
            action: None,
        }
    }
}

impl PlacementInfo {
    pub fn archive_name(&self) -> &str {
        self.archive.as_deref().unwrap_or(&self.name)
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

impl Placement {
    /// Parses placement XML: a `<placement>` root holding `<zone>` and
    /// `<actor>` elements.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid placement XML")?;
        let root = document.root_element();

        let mut zones = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("zone")) {
            let id = required_text(&node, "id")?
                .parse::<i32>()
                .map_err(|err| anyhow!("invalid zone id: {err}"))?;
            zones.push(ZonePlacement {
                id,
                position: parse_vec3(optional_text(&node, "position"), Vec3::ZERO)?,
                rotation: parse_vec3(optional_text(&node, "rotation"), Vec3::ZERO)?,
            });
        }

        let mut actors = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("actor")) {
            let mut info = PlacementInfo {
                name: required_text(&node, "name")?,
                ..PlacementInfo::default()
            };
            info.archive = optional_text(&node, "archive");
            info.action = optional_text(&node, "action");
            info.position = parse_vec3(optional_text(&node, "position"), info.position)
                .with_context(|| format!("actor {}", info.name))?;
            info.rotation = parse_vec3(optional_text(&node, "rotation"), info.rotation)
                .with_context(|| format!("actor {}", info.name))?;
            info.scale = parse_vec3(optional_text(&node, "scale"), info.scale)
                .with_context(|| format!("actor {}", info.name))?;
            info.velocity = parse_vec3(optional_text(&node, "velocity"), info.velocity)
                .with_context(|| format!("actor {}", info.name))?;
            if let Some(zone) = optional_text(&node, "zone") {
                info.zone_and_layer.zone_id = zone
                    .parse::<i32>()
                    .map_err(|err| anyhow!("invalid zone for actor {}: {err}", info.name))?;
            }
            if let Some(layer) = optional_text(&node, "layer") {
                info.zone_and_layer.layer_id = LayerId::parse(&layer)?;
            }
            info.radius = optional_text(&node, "radius")
                .map(|radius| {
                    radius
                        .parse::<f32>()
                        .map_err(|err| anyhow!("invalid radius for actor {}: {err}", info.name))
                })
                .transpose()?;
            actors.push(info);
        }

        Ok(Self { zones, actors })
    }

    /// Placement matrix of `zone_id`; unknown zones are placed at the origin.
    pub fn zone_matrix(&self, zone_id: i32) -> Mat4 {
        self.zones
            .iter()
            .find(|zone| zone.id == zone_id)
            .map(ZonePlacement::matrix)
            .unwrap_or(Mat4::IDENTITY)
    }
}

pub(crate) fn radians(degrees: Vec3) -> Vec3 {
    Vec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

/// `T * Rz * Ry * Rx * S`, rotation in radians.
pub fn make_mtx_srt(scale: Vec3, rotation: Vec3, translation: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        scale,
        glam::Quat::from_euler(EulerRot::ZYX, rotation.z, rotation.y, rotation.x),
        translation,
    )
}

/// Recovers the `Z * Y * X` Euler angles (radians) of a rotation matrix.
pub fn euler_from_matrix(matrix: Mat4) -> Vec3 {
    let (_, rotation, _) = matrix.to_scale_rotation_translation();
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    Vec3::new(x, y, z)
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let components = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "vector needs 3 components, found {}",
            components.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <placement>
        <zone>
            <id>1</id>
            <position>100 0 0</position>
            <rotation>0 90 0</rotation>
        </zone>
        <actor>
            <name>Kuribo</name>
            <position>0 5 0</position>
            <velocity>1 0 0</velocity>
            <layer>B</layer>
            <radius>150</radius>
            <action>Wait</action>
        </actor>
        <actor>
            <name>Coin</name>
            <archive>CoinObj</archive>
            <zone>1</zone>
        </actor>
    </placement>
    "#;

    #[test]
    fn parse_placement_populates_actors_and_zones() {
        let placement = Placement::from_xml(SAMPLE).unwrap();
        assert_eq!(placement.zones.len(), 1);
        assert_eq!(placement.actors.len(), 2);

        let kuribo = &placement.actors[0];
        assert_eq!(kuribo.archive_name(), "Kuribo");
        assert_eq!(kuribo.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(kuribo.velocity, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(kuribo.scale, Vec3::ONE);
        assert_eq!(kuribo.zone_and_layer.layer_id, LayerId::Layer(1));
        assert_eq!(kuribo.radius, Some(150.0));
        assert_eq!(kuribo.action.as_deref(), Some("Wait"));

        let coin = &placement.actors[1];
        assert_eq!(coin.archive_name(), "CoinObj");
        assert_eq!(coin.zone_and_layer.zone_id, 1);
        assert_eq!(coin.zone_and_layer.layer_id, LayerId::Common);
    }

    #[test]
    fn zone_matrix_places_zone() {
        let placement = Placement::from_xml(SAMPLE).unwrap();
        let point = placement
            .zone_matrix(1)
            .transform_point3(Vec3::new(0.0, 0.0, 10.0));
        assert!(point.abs_diff_eq(Vec3::new(110.0, 0.0, 0.0), 1e-3));
        assert_eq!(placement.zone_matrix(7), Mat4::IDENTITY);
    }

    #[test]
    fn actor_zone_is_not_a_zone_entry() {
        let placement =
            Placement::from_xml("<placement><actor><name>Coin</name><zone>1</zone></actor></placement>")
                .unwrap();
        assert!(placement.zones.is_empty());
        assert_eq!(placement.actors[0].zone_and_layer.zone_id, 1);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<placement><actor><layer>A</layer></actor></placement>";
        assert!(Placement::from_xml(bad).is_err());
    }

    #[test]
    fn bad_vector_is_an_error() {
        let bad = "<placement><actor><name>A</name><position>1 2</position></actor></placement>";
        assert!(Placement::from_xml(bad).is_err());
    }

    #[test]
    fn layer_names() {
        assert_eq!(LayerId::parse("common").unwrap(), LayerId::Common);
        assert_eq!(LayerId::parse("a").unwrap(), LayerId::Layer(0));
        assert_eq!(LayerId::parse("P").unwrap(), LayerId::Layer(15));
        assert!(LayerId::parse("Q").is_err());
        assert!(LayerId::parse("AB").is_err());
    }

    #[test]
    fn layer_mask_keeps_common_alive() {
        let mask = LayerMask { layers: vec![1] };
        let on = |layer_id| ZoneAndLayer { zone_id: 0, layer_id };
        assert!(mask.check_alive_scenario(on(LayerId::Common)));
        assert!(mask.check_alive_scenario(on(LayerId::Layer(1))));
        assert!(!mask.check_alive_scenario(on(LayerId::Layer(0))));
    }

    #[test]
    fn euler_round_trip() {
        let rotation = Vec3::new(0.3, -0.4, 1.1);
        let matrix = make_mtx_srt(Vec3::ONE, rotation, Vec3::ZERO);
        assert!(euler_from_matrix(matrix).abs_diff_eq(rotation, 1e-4));
    }
}
