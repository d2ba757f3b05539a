use assets_rigbake::EncodeError;
use scene_rigbake::ImportError;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Recoverable problems found while resolving a scene. Each one has a documented fallback
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveIssue
{
    /// Bone bound as identity
    MissingBoneNode
    {
        bone: String,
    },
    /// Inverse replaced with identity
    SingularMatrix
    {
        what: &'static str,
        node: String,
    },
    /// Vertices take all-zero influences
    UnweightedControlPoint
    {
        mesh: String,
        control_point: u32,
    },
    /// Triangle dropped
    InvalidControlPoint
    {
        mesh: String,
        triangle: usize,
    },
    /// Tangents left at their default
    TangentGenerationFailed
    {
        mesh: String,
    },
    /// Slot skipped
    UnknownMaterial
    {
        node: String,
        slot: usize,
    },
}
impl Display for ResolveIssue
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            ResolveIssue::MissingBoneNode { bone } => write!(f, "bone {bone:?} has no scene node, using identity bind pose"),
            ResolveIssue::SingularMatrix { what, node } => write!(f, "singular {what} matrix on {node:?}, using identity"),
            ResolveIssue::UnweightedControlPoint { mesh, control_point } => write!(f, "control point {control_point} of {mesh:?} has no weights"),
            ResolveIssue::InvalidControlPoint { mesh, triangle } => write!(f, "triangle {triangle} of {mesh:?} references a missing control point, dropped"),
            ResolveIssue::TangentGenerationFailed { mesh } => write!(f, "could not generate tangents for {mesh:?}"),
            ResolveIssue::UnknownMaterial { node, slot } => write!(f, "material slot {slot} of {node:?} has no material, skipped"),
        }
    }
}

/// Per-file issue log
#[derive(Debug, Default)]
pub struct Issues
{
    source: String,
    list: Vec<ResolveIssue>,
}
impl Issues
{
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self
    {
        Self { source: source.into(), list: Vec::new() }
    }

    pub fn push(&mut self, issue: ResolveIssue)
    {
        log::warn!("{}: {issue}", self.source);
        self.list.push(issue);
    }

    #[inline] #[must_use] pub fn len(&self) -> usize { self.list.len() }
    #[inline] #[must_use] pub fn is_empty(&self) -> bool { self.list.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &ResolveIssue> { self.list.iter() }
}

#[derive(Debug)]
pub enum BakeError
{
    Import(ImportError),
    Encode(EncodeError),
    NoAnimationStack,
    NoGeometry,
}
impl Error for BakeError { }
impl Display for BakeError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl From<ImportError> for BakeError
{
    fn from(err: ImportError) -> Self { BakeError::Import(err) }
}
impl From<EncodeError> for BakeError
{
    fn from(err: EncodeError) -> Self { BakeError::Encode(err) }
}
