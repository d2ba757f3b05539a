use math_rigbake::{Axis, CoordinateConvention};
use nab_rigbake::{TomlRead, TomlWrite};
use scene_rigbake::{AxisSystem, Scene};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io::Read;

/// Length of one unit in the baked files, in meters
pub const TARGET_UNIT_METERS: f64 = 1.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BakeMode
{
    /// Skeleton, skinned and rigidly attached meshes
    #[default]
    Model,
    /// Skinned meshes only, mirrored on X
    Skinned,
    /// Unskinned meshes baked into world space
    Static,
    /// Bone tracks of the active clip
    #[serde(alias = "anim")]
    #[value(name = "anim", alias = "animation")]
    Animation,
}
impl BakeMode
{
    #[inline] #[must_use]
    pub fn is_animation(self) -> bool { self == BakeMode::Animation }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFilter
{
    #[default]
    All,
    Skinned,
    Static,
}
impl MeshFilter
{
    #[inline] #[must_use]
    pub fn accepts(self, is_skinned: bool) -> bool
    {
        match self
        {
            MeshFilter::All => true,
            MeshFilter::Skinned => is_skinned,
            MeshFilter::Static => !is_skinned,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirror
{
    #[default]
    None,
    X,
    Y,
    Z,
}
impl Mirror
{
    #[must_use]
    pub fn axis(self) -> Option<Axis>
    {
        match self
        {
            Mirror::None => None,
            Mirror::X => Some(Axis::X),
            Mirror::Y => Some(Axis::Y),
            Mirror::Z => Some(Axis::Z),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisConvention
{
    /// Keep the source scene's axes
    #[default]
    None,
    DirectX,
    OpenGl,
    Max,
}
impl AxisConvention
{
    #[must_use]
    pub fn axis_system(self) -> Option<AxisSystem>
    {
        match self
        {
            AxisConvention::None => None,
            AxisConvention::DirectX => Some(AxisSystem::DIRECTX),
            AxisConvention::OpenGl => Some(AxisSystem::OPENGL),
            AxisConvention::Max => Some(AxisSystem::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig
{
    /// Only skeleton nodes produce tracks
    pub skeleton_only: bool,
}
impl Default for TrackConfig
{
    fn default() -> Self { Self { skeleton_only: true } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig
{
    pub include_skeleton: bool,
    pub include_skin: bool,
    pub mesh_filter: MeshFilter,
    pub mirror: Mirror,
    /// Translation scale. Derived from the scene's unit when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_scale: Option<f64>,
    pub axis_system: AxisConvention,
    /// Also switches the model container to version 2
    pub generate_tangents: bool,
    /// Negate all three axes of static meshes before baking
    pub legacy_static_flip: bool,
    /// Bone for unskinned meshes with no bone ancestor
    pub default_bone: u32,
    pub tracks: TrackConfig,
}
impl Default for BakeConfig
{
    fn default() -> Self { Self::preset(BakeMode::Model) }
}
impl TomlRead for BakeConfig { }
impl TomlWrite for BakeConfig { }
impl BakeConfig
{
    #[must_use]
    pub fn preset(mode: BakeMode) -> Self
    {
        let model = Self
        {
            include_skeleton: true,
            include_skin: true,
            mesh_filter: MeshFilter::All,
            mirror: Mirror::None,
            length_scale: None,
            axis_system: AxisConvention::DirectX,
            generate_tangents: false,
            legacy_static_flip: false,
            default_bone: 0,
            tracks: TrackConfig::default(),
        };

        match mode
        {
            BakeMode::Model | BakeMode::Animation => model,
            BakeMode::Skinned => Self
            {
                mesh_filter: MeshFilter::Skinned,
                mirror: Mirror::X,
                axis_system: AxisConvention::None,
                ..model
            },
            BakeMode::Static => Self
            {
                include_skeleton: false,
                include_skin: false,
                mesh_filter: MeshFilter::Static,
                length_scale: Some(1.0),
                ..model
            },
        }
    }

    /// Keys present in `reader` override `base`; everything else keeps the base value
    pub fn load_over(base: &BakeConfig, reader: &mut impl Read) -> Result<Self, Box<dyn Error>>
    {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let overrides: toml::Table = toml::from_str(&text)?;

        let toml::Value::Table(mut merged) = toml::Value::try_from(base)? else
        {
            return Err("config did not serialize to a table".into());
        };
        merge_tables(&mut merged, overrides);
        Ok(toml::Value::Table(merged).try_into()?)
    }

    #[must_use]
    pub fn convention(&self, scene: &Scene) -> CoordinateConvention
    {
        CoordinateConvention
        {
            mirror: self.mirror.axis(),
            length_scale: self.length_scale.unwrap_or(scene.unit_meters / TARGET_UNIT_METERS),
        }
    }

    #[must_use]
    pub fn format_version(&self) -> u32
    {
        match self.generate_tangents
        {
            true => assets_rigbake::ModelFile::VERSION_TANGENTS,
            false => assets_rigbake::ModelFile::VERSION_BASIC,
        }
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table)
{
    for (key, value) in overrides
    {
        let value = match (base.get_mut(&key), value)
        {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(override_table)) =>
            {
                merge_tables(base_table, override_table);
                continue;
            }
            (_, value) => value,
        };
        base.insert(key, value);
    }
}
