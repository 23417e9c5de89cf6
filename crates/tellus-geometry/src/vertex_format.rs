//! Which vertex attributes a tessellation emits.

/// Toggles for the attributes a tessellator should generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexFormat {
    /// Emit vertex positions (always wanted in practice).
    pub position: bool,
    /// Emit geodetic surface normals.
    pub normal: bool,
    /// Emit texture coordinates.
    pub st: bool,
    /// Emit tangent vectors (requires `st` orientation to be meaningful).
    pub tangent: bool,
    /// Emit binormal vectors.
    pub binormal: bool,
}

impl VertexFormat {
    /// Positions only.
    pub const POSITION_ONLY: Self = Self {
        position: true,
        normal: false,
        st: false,
        tangent: false,
        binormal: false,
    };

    /// Positions, normals, and texture coordinates — the common lit case.
    pub const POSITION_NORMAL_ST: Self = Self {
        position: true,
        normal: true,
        st: true,
        tangent: false,
        binormal: false,
    };

    /// Every supported attribute.
    pub const ALL: Self = Self {
        position: true,
        normal: true,
        st: true,
        tangent: true,
        binormal: true,
    };
}

impl Default for VertexFormat {
    fn default() -> Self {
        Self::POSITION_NORMAL_ST
    }
}
