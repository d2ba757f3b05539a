use crate::{BinRead, BinWrite, DecodeError, EncodeError};
use glam::Mat4;
use std::io::{Read, Write};

pub const MAX_INFLUENCES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Bone
{
    pub name: String,
    /// -1 for roots, otherwise always lower than this bone's index
    pub parent_index: i32,
    pub bind_local: Mat4,
    /// Inverse of the global bind pose
    pub offset_matrix: Mat4,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Material
{
    pub name: String,
    pub diffuse_texture_name: String,
    /// Version 2+
    pub normal_texture_name: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vertex
{
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Version 2+. w is the bitangent sign
    pub tangent: [f32; 4],
    pub bone_indices: [u32; MAX_INFLUENCES],
    /// Sorted descending; sums to 1 or all zero
    pub bone_weights: [f32; MAX_INFLUENCES],
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SubMesh
{
    pub mesh_name: String,
    pub material_index: u32,
    pub vertices: Vec<Vertex>,
    /// Triangle list
    pub indices: Vec<u32>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModelFlags(pub u32);
impl ModelFlags
{
    pub const NONE: Self = Self(0);
    pub const HAS_SKELETON: Self = Self(1 << 0);
    pub const SKINNED: Self = Self(1 << 1);
    pub const MIRRORED: Self = Self(1 << 2);

    #[inline] #[must_use]
    pub fn contains(self, other: Self) -> bool { (self.0 & other.0) == other.0 }
}
impl std::ops::BitOr for ModelFlags
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output { Self(self.0 | rhs.0) }
}
impl std::ops::BitOrAssign for ModelFlags
{
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

/// Skeleton, materials and geometry of one source scene
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ModelFile
{
    pub version: u32,
    pub flags: ModelFlags,
    pub bones: Vec<Bone>,
    pub materials: Vec<Material>,
    pub sub_meshes: Vec<SubMesh>,
}
impl ModelFile
{
    pub const MAGIC: [u8; 4] = *b"MBIN";
    /// No tangents, no normal textures
    pub const VERSION_BASIC: u32 = 1;
    pub const VERSION_TANGENTS: u32 = 2;

    #[inline] #[must_use]
    pub fn has_tangents(&self) -> bool { self.version >= Self::VERSION_TANGENTS }

    #[must_use]
    pub fn vertex_count(&self) -> usize { self.sub_meshes.iter().map(|s| s.vertices.len()).sum() }

    pub fn encode(&self, writer: &mut impl Write) -> Result<(), EncodeError>
    {
        writer.write_all(&Self::MAGIC)?;
        writer.write_u32_le(self.version)?;
        writer.write_u32_le(self.flags.0)?;
        writer.write_count("bones", self.bones.len())?;
        writer.write_count("materials", self.materials.len())?;
        writer.write_count("sub-meshes", self.sub_meshes.len())?;

        for bone in &self.bones
        {
            writer.write_str(&bone.name)?;
            writer.write_i32_le(bone.parent_index)?;
            writer.write_f32s(&bone.bind_local.to_cols_array())?;
            writer.write_f32s(&bone.offset_matrix.to_cols_array())?;
        }

        for material in &self.materials
        {
            writer.write_str(&material.name)?;
            writer.write_str(&material.diffuse_texture_name)?;
            if self.has_tangents()
            {
                writer.write_str(&material.normal_texture_name)?;
            }
        }

        for sub_mesh in &self.sub_meshes
        {
            writer.write_str(&sub_mesh.mesh_name)?;
            writer.write_u32_le(sub_mesh.material_index)?;
            writer.write_count("vertices", sub_mesh.vertices.len())?;
            writer.write_count("indices", sub_mesh.indices.len())?;

            for vertex in &sub_mesh.vertices
            {
                writer.write_f32s(&vertex.position)?;
                writer.write_f32s(&vertex.normal)?;
                writer.write_f32s(&vertex.uv)?;
                if self.has_tangents()
                {
                    writer.write_f32s(&vertex.tangent)?;
                }
                writer.write_u32s(&vertex.bone_indices)?;
                writer.write_f32s(&vertex.bone_weights)?;
            }
            writer.write_u32s(&sub_mesh.indices)?;
        }

        Ok(())
    }

    pub fn decode(reader: &mut impl Read) -> Result<Self, DecodeError>
    {
        reader.expect_magic(Self::MAGIC)?;
        let version = reader.read_u32_le()?;
        if !(Self::VERSION_BASIC..=Self::VERSION_TANGENTS).contains(&version)
        {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let has_tangents = version >= Self::VERSION_TANGENTS;

        let flags = ModelFlags(reader.read_u32_le()?);
        let bone_count = reader.read_u32_le()?;
        let material_count = reader.read_u32_le()?;
        let sub_mesh_count = reader.read_u32_le()?;

        let mut bones = Vec::new();
        for _ in 0..bone_count
        {
            bones.push(Bone
            {
                name: reader.read_str()?,
                parent_index: reader.read_i32_le()?,
                bind_local: Mat4::from_cols_array(&reader.read_f32s()?),
                offset_matrix: Mat4::from_cols_array(&reader.read_f32s()?),
            });
        }

        let mut materials = Vec::new();
        for _ in 0..material_count
        {
            materials.push(Material
            {
                name: reader.read_str()?,
                diffuse_texture_name: reader.read_str()?,
                normal_texture_name: if has_tangents { reader.read_str()? } else { String::new() },
            });
        }

        let mut sub_meshes = Vec::new();
        for _ in 0..sub_mesh_count
        {
            let mesh_name = reader.read_str()?;
            let material_index = reader.read_u32_le()?;
            let vertex_count = reader.read_u32_le()?;
            let index_count = reader.read_u32_le()?;

            let mut vertices = Vec::new();
            for _ in 0..vertex_count
            {
                vertices.push(Vertex
                {
                    position: reader.read_f32s()?,
                    normal: reader.read_f32s()?,
                    uv: reader.read_f32s()?,
                    tangent: if has_tangents { reader.read_f32s()? } else { [0.0; 4] },
                    bone_indices: reader.read_u32s()?,
                    bone_weights: reader.read_f32s()?,
                });
            }

            let mut indices = Vec::new();
            for _ in 0..index_count
            {
                indices.push(reader.read_u32_le()?);
            }

            sub_meshes.push(SubMesh { mesh_name, material_index, vertices, indices });
        }

        Ok(Self { version, flags, bones, materials, sub_meshes })
    }
}
