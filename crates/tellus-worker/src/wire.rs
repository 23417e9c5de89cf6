//! Wire types for the worker boundary.
//!
//! Everything here is serde-derivable plain data: flat, tightly packed
//! buffers and scalar fields, no library vector types. Converting a
//! [`Geometry`] into a [`GeometryPayload`] moves the attribute buffers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tellus_geometry::{
    AttributeSemantic, AttributeValues, Geometry, PrimitiveTopology, VertexFormat,
};

/// Extent bounds in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtentParameters {
    /// Westernmost longitude.
    pub west: f64,
    /// Southernmost latitude.
    pub south: f64,
    /// Easternmost longitude.
    pub east: f64,
    /// Northernmost latitude.
    pub north: f64,
}

/// Which attributes the caller wants emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexFormatFlags {
    /// Emit positions.
    pub position: bool,
    /// Emit normals.
    pub normal: bool,
    /// Emit texture coordinates.
    pub st: bool,
    /// Emit tangents.
    pub tangent: bool,
    /// Emit binormals.
    pub binormal: bool,
}

impl From<VertexFormatFlags> for VertexFormat {
    fn from(flags: VertexFormatFlags) -> Self {
        Self {
            position: flags.position,
            normal: flags.normal,
            st: flags.st,
            tangent: flags.tangent,
            binormal: flags.binormal,
        }
    }
}

/// All inputs for one tessellation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TessellationParameters {
    /// The extent to tessellate.
    pub extent: ExtentParameters,
    /// Ellipsoid radii, meters, `[x, y, z]`.
    pub ellipsoid_radii: [f64; 3],
    /// Angular step between samples, radians.
    pub granularity: f64,
    /// Surface height above the ellipsoid, meters.
    pub height: f64,
    /// Second height for extrusion, meters.
    #[serde(default)]
    pub extruded_height: Option<f64>,
    /// In-plane footprint rotation, radians.
    #[serde(default)]
    pub rotation: f64,
    /// Texture-coordinate rotation, radians.
    #[serde(default)]
    pub st_rotation: f64,
    /// Whether an extrusion gets a top cap.
    #[serde(default = "default_true")]
    pub close_top: bool,
    /// Whether an extrusion gets a bottom cap.
    #[serde(default = "default_true")]
    pub close_bottom: bool,
    /// Which attributes to emit.
    pub vertex_format: VertexFormatFlags,
}

fn default_true() -> bool {
    true
}

/// One unit of work: a caller-chosen id plus the parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TessellationRequest {
    /// Caller-supplied correlation id, echoed in the response.
    pub id: u64,
    /// The tessellation inputs.
    pub parameters: TessellationParameters,
}

/// Primitive topology tag on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WirePrimitiveTopology {
    /// Isolated points.
    Points,
    /// Isolated segments.
    Lines,
    /// A closed loop of segments.
    LineLoop,
    /// A connected strip of segments.
    LineStrip,
    /// Isolated triangles.
    Triangles,
    /// A connected strip of triangles.
    TriangleStrip,
    /// A fan of triangles.
    TriangleFan,
}

impl From<PrimitiveTopology> for WirePrimitiveTopology {
    fn from(topology: PrimitiveTopology) -> Self {
        match topology {
            PrimitiveTopology::Points => Self::Points,
            PrimitiveTopology::Lines => Self::Lines,
            PrimitiveTopology::LineLoop => Self::LineLoop,
            PrimitiveTopology::LineStrip => Self::LineStrip,
            PrimitiveTopology::Triangles => Self::Triangles,
            PrimitiveTopology::TriangleStrip => Self::TriangleStrip,
            PrimitiveTopology::TriangleFan => Self::TriangleFan,
        }
    }
}

/// A flat attribute buffer on the wire; the variant tag is the component
/// datatype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WireBuffer {
    /// Signed 8-bit components.
    I8(Vec<i8>),
    /// Unsigned 8-bit components.
    U8(Vec<u8>),
    /// Signed 16-bit components.
    I16(Vec<i16>),
    /// Unsigned 16-bit components.
    U16(Vec<u16>),
    /// 32-bit float components.
    F32(Vec<f32>),
    /// 64-bit float components.
    F64(Vec<f64>),
}

impl From<AttributeValues> for WireBuffer {
    fn from(values: AttributeValues) -> Self {
        match values {
            AttributeValues::I8(v) => Self::I8(v),
            AttributeValues::U8(v) => Self::U8(v),
            AttributeValues::I16(v) => Self::I16(v),
            AttributeValues::U16(v) => Self::U16(v),
            AttributeValues::F32(v) => Self::F32(v),
            AttributeValues::F64(v) => Self::F64(v),
        }
    }
}

/// One vertex attribute on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireAttribute {
    /// Components per vertex.
    pub components_per_attribute: usize,
    /// Whether integer components are shader-normalized.
    pub normalize: bool,
    /// The flat component buffer; its variant is the datatype.
    pub values: WireBuffer,
}

/// Bounding sphere on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingSpherePayload {
    /// Sphere center, `[x, y, z]` meters.
    pub center: [f64; 3],
    /// Sphere radius, meters.
    pub radius: f64,
}

/// A complete geometry crossing the boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryPayload {
    /// Attributes keyed by name (`"position"`, `"normal"`, `"st"`, ...).
    pub attributes: BTreeMap<String, WireAttribute>,
    /// Optional index buffer.
    pub indices: Option<Vec<u32>>,
    /// How primitives are assembled.
    pub primitive_topology: WirePrimitiveTopology,
    /// Optional enclosing sphere.
    pub bounding_sphere: Option<BoundingSpherePayload>,
}

/// Wire name of an attribute semantic.
fn semantic_name(semantic: AttributeSemantic) -> &'static str {
    match semantic {
        AttributeSemantic::Position => "position",
        AttributeSemantic::Normal => "normal",
        AttributeSemantic::Tangent => "tangent",
        AttributeSemantic::Binormal => "binormal",
        AttributeSemantic::St => "st",
        AttributeSemantic::Color => "color",
    }
}

impl From<Geometry> for GeometryPayload {
    fn from(geometry: Geometry) -> Self {
        let bounding_sphere = geometry.bounding_sphere.map(|sphere| BoundingSpherePayload {
            center: [sphere.center.x, sphere.center.y, sphere.center.z],
            radius: sphere.radius,
        });
        let primitive_topology = geometry.primitive_topology.into();
        let indices = geometry.indices;

        let attributes = geometry
            .attributes
            .into_iter()
            .map(|(semantic, attribute)| {
                (
                    semantic_name(semantic).to_string(),
                    WireAttribute {
                        components_per_attribute: attribute.components_per_attribute,
                        normalize: attribute.normalize,
                        values: attribute.values.into(),
                    },
                )
            })
            .collect();

        Self {
            attributes,
            indices,
            primitive_topology,
            bounding_sphere,
        }
    }
}

/// The reply for one request: the echoed id plus geometry or a
/// human-readable error. Callers must not retry automatically — every
/// computation is deterministic in its inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TessellationResponse {
    /// The id from the originating request.
    pub id: u64,
    /// The produced geometry, or what went wrong.
    pub result: Result<GeometryPayload, String>,
}
