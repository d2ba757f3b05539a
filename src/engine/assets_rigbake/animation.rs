use crate::{BinRead, BinWrite, DecodeError, EncodeError};
use glam::{Quat, Vec3};
use nab_rigbake::timing::FSeconds;
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe
{
    /// Relative to the clip start
    pub time: FSeconds,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// Keys of one bone, matched to a skeleton by name
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Track
{
    pub bone_name: String,
    /// Strictly ascending in time
    pub keys: Vec<Keyframe>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnimationFile
{
    pub version: u32,
    pub clip_name: String,
    pub duration: FSeconds,
    pub tracks: Vec<Track>,
}
impl AnimationFile
{
    pub const MAGIC: [u8; 4] = *b"ABIN";
    pub const VERSION: u32 = 1;
    /// Tracks are bound by name at load time
    pub const NO_BONE_INDEX: i32 = -1;

    #[must_use]
    pub fn key_count(&self) -> usize { self.tracks.iter().map(|t| t.keys.len()).sum() }

    pub fn encode(&self, writer: &mut impl Write) -> Result<(), EncodeError>
    {
        writer.write_all(&Self::MAGIC)?;
        writer.write_u32_le(self.version)?;
        writer.write_str(&self.clip_name)?;
        writer.write_f32_le(self.duration.0)?;
        writer.write_count("tracks", self.tracks.len())?;

        for track in &self.tracks
        {
            writer.write_str(&track.bone_name)?;
            writer.write_i32_le(Self::NO_BONE_INDEX)?;
            writer.write_count("keys", track.keys.len())?;
            for key in &track.keys
            {
                writer.write_f32_le(key.time.0)?;
                writer.write_f32s(&key.translation.to_array())?;
                writer.write_f32s(&key.rotation.to_array())?;
                writer.write_f32s(&key.scale.to_array())?;
            }
        }

        Ok(())
    }

    pub fn decode(reader: &mut impl Read) -> Result<Self, DecodeError>
    {
        reader.expect_magic(Self::MAGIC)?;
        let version = reader.read_u32_le()?;
        if version != Self::VERSION
        {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let clip_name = reader.read_str()?;
        let duration = FSeconds(reader.read_f32_le()?);
        let track_count = reader.read_u32_le()?;

        let mut tracks = Vec::new();
        for _ in 0..track_count
        {
            let bone_name = reader.read_str()?;
            let _bone_index_hint = reader.read_i32_le()?;
            let key_count = reader.read_u32_le()?;

            let mut keys = Vec::new();
            for _ in 0..key_count
            {
                keys.push(Keyframe
                {
                    time: FSeconds(reader.read_f32_le()?),
                    translation: Vec3::from_array(reader.read_f32s()?),
                    rotation: Quat::from_array(reader.read_f32s()?),
                    scale: Vec3::from_array(reader.read_f32s()?),
                });
            }
            tracks.push(Track { bone_name, keys });
        }

        Ok(Self { version, clip_name, duration, tracks })
    }
}
