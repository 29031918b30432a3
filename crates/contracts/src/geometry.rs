//! Geometry records - transforms in, twists out
//!
//! Field layout follows the usual robotics message shapes so the JSON form of a
//! `TwistStamped` is `{"header":{"frame_id","stamp"},"twist":{"linear","angular"}}`.

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Unit quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rigid transform: translation + rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation in meters
    pub translation: Vector3,

    /// Rotation
    pub rotation: Quaternion,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vector3::ZERO,
        rotation: Quaternion::IDENTITY,
    };
}

/// Record header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Frame the payload is expressed in
    pub frame_id: String,

    /// Timestamp (seconds)
    pub stamp: f64,
}

/// Time-stamped parent -> child transform
///
/// `header.frame_id` is the parent frame. The transform maps points from the
/// child frame into the parent frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStamped {
    pub header: Header,

    pub child_frame_id: String,

    pub transform: Transform,

    /// Time-invariant edge (valid at every time)
    #[serde(default)]
    pub is_static: bool,
}

impl TransformStamped {
    /// Create a dynamic transform record
    pub fn new(
        parent: impl Into<String>,
        child: impl Into<String>,
        stamp: f64,
        transform: Transform,
    ) -> Self {
        Self {
            header: Header {
                frame_id: parent.into(),
                stamp,
            },
            child_frame_id: child.into(),
            transform,
            is_static: false,
        }
    }

    /// Create a static transform record
    pub fn new_static(
        parent: impl Into<String>,
        child: impl Into<String>,
        transform: Transform,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::new(parent, child, 0.0, transform)
        }
    }

    pub fn parent_frame(&self) -> &str {
        &self.header.frame_id
    }

    pub fn stamp(&self) -> f64 {
        self.header.stamp
    }
}

/// Instantaneous velocity: linear (m/s) + angular (rad/s)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    pub const ZERO: Self = Self {
        linear: Vector3::ZERO,
        angular: Vector3::ZERO,
    };

    pub const fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }
}

/// Time-stamped twist (the published record)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwistStamped {
    pub header: Header,
    pub twist: Twist,
}

impl TwistStamped {
    pub fn new(frame_id: impl Into<String>, stamp: f64, twist: Twist) -> Self {
        Self {
            header: Header {
                frame_id: frame_id.into(),
                stamp,
            },
            twist,
        }
    }
}
