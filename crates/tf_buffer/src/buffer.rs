//! TransformBuffer - frame graph over per-edge histories.
//!
//! Each child frame has exactly one parent. A lookup walks both frames up to
//! their closest common ancestor and composes the interpolated edges.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use contracts::{
    normalize_frame_id, ContractError, LookupError, LookupTime, Transform, TransformStamped,
    Twist, Vector3, DEFAULT_CACHE_TIME_S,
};
use nalgebra::{Isometry3, Vector3 as NaVector3};
use tracing::debug;

use crate::history::TransformHistory;

/// Guard against parent cycles introduced by bad input
const MAX_GRAPH_DEPTH: usize = 1000;

/// Keeps `start` strictly positive when the averaging window would reach zero
const MIN_START_TIME: f64 = 1e-5;

/// Buffer sizing
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Seconds of history kept per edge
    pub cache_time: f64,
    /// Hard cap on entries per edge
    pub max_entries_per_edge: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            cache_time: DEFAULT_CACHE_TIME_S,
            max_entries_per_edge: 10_000,
        }
    }
}

/// Frames on both sides of a lookup, below their common ancestor
///
/// Each list runs from the frame itself upward and excludes the ancestor.
#[derive(Debug)]
struct LookupPath<'a> {
    target_chain: Vec<&'a str>,
    source_chain: Vec<&'a str>,
}

impl LookupPath<'_> {
    fn edges(&self) -> impl Iterator<Item = &str> {
        self.target_chain
            .iter()
            .chain(self.source_chain.iter())
            .copied()
    }
}

/// In-memory transform graph
#[derive(Debug, Default)]
pub struct TransformBuffer {
    config: BufferConfig,
    /// child frame -> edge history (history knows its parent)
    edges: HashMap<String, TransformHistory>,
}

impl TransformBuffer {
    /// Create a buffer with default sizing
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with custom sizing
    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            config,
            edges: HashMap::new(),
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Insert a parent -> child transform
    ///
    /// # Errors
    /// Malformed records (empty or self-referencing frames, non-finite values,
    /// degenerate rotation) and records older than the history window.
    pub fn insert(&mut self, mut tf: TransformStamped) -> Result<(), ContractError> {
        normalize_record(&mut tf);
        validate_record(&tf)?;

        let child = tf.child_frame_id.clone();
        let parent = tf.parent_frame().to_string();

        let reparent = self
            .edges
            .get(&child)
            .is_some_and(|history| history.parent() != parent);
        if reparent {
            debug!(child = %child, parent = %parent, "re-parenting frame");
            self.edges.remove(&child);
        }

        let config = &self.config;
        self.edges
            .entry(child)
            .or_insert_with(|| {
                TransformHistory::new(parent, config.max_entries_per_edge, config.cache_time)
            })
            .insert(tf)
    }

    /// Whether the frame appears anywhere in the graph
    pub fn has_frame(&self, frame: &str) -> bool {
        let frame = normalize_frame_id(frame);
        self.edges.contains_key(frame) || self.edges.values().any(|h| h.parent() == frame)
    }

    /// All known frames, sorted
    pub fn frames(&self) -> Vec<String> {
        let mut frames: HashSet<&str> = HashSet::new();
        for (child, history) in &self.edges {
            frames.insert(child);
            frames.insert(history.parent());
        }
        let mut frames: Vec<String> = frames.into_iter().map(String::from).collect();
        frames.sort();
        frames
    }

    /// Parent of a frame (None for roots and unknown frames)
    pub fn parent_of(&self, frame: &str) -> Option<&str> {
        self.edges.get(normalize_frame_id(frame)).map(TransformHistory::parent)
    }

    /// Whether `lookup_transform(target, source, at)` would succeed
    pub fn can_transform(&self, target: &str, source: &str, at: LookupTime) -> bool {
        self.lookup_transform(target, source, at).is_ok()
    }

    /// Newest time at which every dynamic edge between the frames has data
    ///
    /// Returns 0.0 when the path consists of static edges only.
    pub fn latest_common_time(&self, target: &str, source: &str) -> Result<f64, LookupError> {
        let path = self.resolve(target, source)?;
        self.path_latest_time(&path)
    }

    /// Pose of `source` expressed in `target`
    pub fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        at: LookupTime,
    ) -> Result<TransformStamped, LookupError> {
        let path = self.resolve(target, source)?;
        let stamp = match at {
            LookupTime::Latest => self.path_latest_time(&path)?,
            LookupTime::At(t) => t,
        };
        let iso = self.path_transform(&path, stamp)?;
        Ok(TransformStamped::new(
            target,
            source,
            stamp,
            from_isometry(&iso),
        ))
    }

    /// Velocity of `tracking` observed from `observation`
    ///
    /// The window ends half an interval after the reference time, clamped to
    /// the latest common time, and spans `interval` (shortened if it would
    /// start before zero). Linear velocity is the translation difference over
    /// the window; angular velocity is the axis-angle of the relative rotation,
    /// expressed in the observation frame.
    pub fn lookup_twist(
        &self,
        tracking: &str,
        observation: &str,
        at: LookupTime,
        interval: Duration,
    ) -> Result<Twist, LookupError> {
        let path = self.resolve(observation, tracking)?;
        let latest = self.path_latest_time(&path)?;
        let target_time = match at {
            LookupTime::Latest => latest,
            LookupTime::At(t) => t,
        };

        let averaging = interval.as_secs_f64();
        let end = (target_time + averaging * 0.5).min(latest);
        let start = (MIN_START_TIME + averaging).max(end) - averaging;
        let dt = end - start;
        if dt <= 0.0 {
            return Ok(Twist::ZERO);
        }

        let start_pose = self.path_transform(&path, start)?;
        let end_pose = self.path_transform(&path, end)?;

        let linear = (end_pose.translation.vector - start_pose.translation.vector) / dt;
        let delta = start_pose.rotation.inverse() * end_pose.rotation;
        let angular = start_pose.rotation * delta.scaled_axis() / dt;

        Ok(Twist::new(to_vector(&linear), to_vector(&angular)))
    }

    /// Frames from `frame` up to and including its root
    fn chain_to_root<'a>(&'a self, frame: &'a str) -> Result<Vec<&'a str>, LookupError> {
        let mut chain = vec![frame];
        let mut current = frame;
        while let Some(history) = self.edges.get(current) {
            current = history.parent();
            chain.push(current);
            if chain.len() > MAX_GRAPH_DEPTH {
                return Err(LookupError::other(format!(
                    "frame graph loop detected above '{frame}'"
                )));
            }
        }
        Ok(chain)
    }

    fn resolve<'a>(&'a self, target: &'a str, source: &'a str) -> Result<LookupPath<'a>, LookupError> {
        let target = normalize_frame_id(target);
        let source = normalize_frame_id(source);
        for frame in [target, source] {
            if !self.has_frame(frame) {
                return Err(LookupError::unknown_frame(frame));
            }
        }

        let target_up = self.chain_to_root(target)?;
        let source_up = self.chain_to_root(source)?;

        let source_set: HashSet<&str> = source_up.iter().copied().collect();
        let Some(target_idx) = target_up.iter().position(|f| source_set.contains(f)) else {
            return Err(LookupError::disconnected(source, target));
        };
        let ancestor = target_up[target_idx];
        let source_idx = source_up
            .iter()
            .position(|f| *f == ancestor)
            .unwrap_or(source_up.len());

        Ok(LookupPath {
            target_chain: target_up[..target_idx].to_vec(),
            source_chain: source_up[..source_idx].to_vec(),
        })
    }

    fn path_latest_time(&self, path: &LookupPath<'_>) -> Result<f64, LookupError> {
        let mut latest: Option<f64> = None;
        for child in path.edges() {
            let history = self.edge(child)?;
            if history.is_static() {
                continue;
            }
            if let Some(stamp) = history.latest_stamp() {
                latest = Some(latest.map_or(stamp, |l| l.min(stamp)));
            }
        }
        Ok(latest.unwrap_or(0.0))
    }

    /// T_target_source at `stamp`
    fn path_transform(&self, path: &LookupPath<'_>, stamp: f64) -> Result<Isometry3<f64>, LookupError> {
        let ancestor_from_target = self.chain_transform(&path.target_chain, stamp)?;
        let ancestor_from_source = self.chain_transform(&path.source_chain, stamp)?;
        Ok(ancestor_from_target.inverse() * ancestor_from_source)
    }

    /// T_ancestor_frame for a chain that starts at `frame`
    fn chain_transform(&self, chain: &[&str], stamp: f64) -> Result<Isometry3<f64>, LookupError> {
        let mut acc = Isometry3::identity();
        for child in chain {
            acc = self.edge(child)?.sample(stamp)? * acc;
        }
        Ok(acc)
    }

    fn edge(&self, child: &str) -> Result<&TransformHistory, LookupError> {
        self.edges
            .get(child)
            .ok_or_else(|| LookupError::unknown_frame(child))
    }
}

fn normalize_record(tf: &mut TransformStamped) {
    if let Some(parent) = tf.header.frame_id.strip_prefix('/') {
        tf.header.frame_id = parent.to_string();
    }
    if let Some(child) = tf.child_frame_id.strip_prefix('/') {
        tf.child_frame_id = child.to_string();
    }
}

fn validate_record(tf: &TransformStamped) -> Result<(), ContractError> {
    let parent = tf.parent_frame();
    let child = tf.child_frame_id.as_str();
    let reject = |message: &str| ContractError::transform_rejected(parent, child, message);

    if parent.is_empty() || child.is_empty() {
        return Err(reject("frame ids cannot be empty"));
    }
    if parent == child {
        return Err(reject("parent and child frame are identical"));
    }
    if !tf.stamp().is_finite() {
        return Err(reject("stamp is not finite"));
    }
    let t = &tf.transform.translation;
    let q = &tf.transform.rotation;
    if ![t.x, t.y, t.z, q.x, q.y, q.z, q.w]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(reject("transform contains non-finite values"));
    }
    let norm = (q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w).sqrt();
    if norm < 1e-6 {
        return Err(reject("rotation quaternion has zero length"));
    }
    Ok(())
}

fn to_vector(v: &NaVector3<f64>) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

fn from_isometry(iso: &Isometry3<f64>) -> Transform {
    let q = iso.rotation.quaternion();
    Transform {
        translation: to_vector(&iso.translation.vector),
        rotation: contracts::Quaternion::new(q.i, q.j, q.k, q.w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;
    use rand::Rng;

    const ONE_SECOND: Duration = Duration::from_secs(1);

    fn translation(x: f64, y: f64, z: f64) -> Transform {
        Transform {
            translation: Vector3::new(x, y, z),
            ..Transform::IDENTITY
        }
    }

    fn rotation(q: UnitQuaternion<f64>) -> Transform {
        Transform {
            translation: Vector3::ZERO,
            rotation: contracts::Quaternion::new(q.i, q.j, q.k, q.w),
        }
    }

    fn assert_close(actual: Vector3, expected: Vector3) {
        let err = ((actual.x - expected.x).powi(2)
            + (actual.y - expected.y).powi(2)
            + (actual.z - expected.z).powi(2))
        .sqrt();
        assert!(err < 1e-6, "expected {expected:?}, got {actual:?}");
    }

    /// odom -> base_link moving along x at `speed` m/s from t=100 to t=102
    fn moving_base(speed: f64) -> TransformBuffer {
        let mut buffer = TransformBuffer::new();
        for i in 0..=20 {
            let t = 100.0 + i as f64 * 0.1;
            buffer
                .insert(TransformStamped::new(
                    "odom",
                    "base_link",
                    t,
                    translation(speed * (t - 100.0), 0.0, 0.0),
                ))
                .unwrap();
        }
        buffer
    }

    #[test]
    fn test_leading_slash_names_the_same_frame() {
        let mut buffer = moving_base(1.0);
        buffer
            .insert(TransformStamped::new_static(
                "/base_link",
                "/laser",
                translation(0.3, 0.0, 0.2),
            ))
            .unwrap();

        let twist = buffer
            .lookup_twist("/base_link", "/odom", LookupTime::Latest, Duration::from_secs(1))
            .unwrap();
        assert_close(twist.linear, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(buffer.parent_of("/laser"), Some("base_link"));
        assert!(buffer.has_frame("/odom"));
        assert!(buffer.can_transform("laser", "/odom", LookupTime::Latest));
    }

    #[test]
    fn test_frames_and_parents() {
        let mut buffer = moving_base(1.0);
        buffer
            .insert(TransformStamped::new_static(
                "base_link",
                "laser",
                translation(0.3, 0.0, 0.2),
            ))
            .unwrap();

        assert_eq!(buffer.frames(), vec!["base_link", "laser", "odom"]);
        assert_eq!(buffer.parent_of("laser"), Some("base_link"));
        assert_eq!(buffer.parent_of("odom"), None);
        assert!(buffer.has_frame("odom"));
        assert!(!buffer.has_frame("map"));
    }

    #[test]
    fn test_lookup_through_static_child() {
        let mut buffer = moving_base(2.0);
        buffer
            .insert(TransformStamped::new_static(
                "base_link",
                "laser",
                translation(0.5, 0.0, 0.0),
            ))
            .unwrap();

        let tf = buffer
            .lookup_transform("odom", "laser", LookupTime::At(101.0))
            .unwrap();
        assert!((tf.transform.translation.x - 2.5).abs() < 1e-9);

        let inverse = buffer
            .lookup_transform("laser", "odom", LookupTime::At(101.0))
            .unwrap();
        assert!((inverse.transform.translation.x + 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_latest_resolves_to_common_time() {
        let mut buffer = moving_base(1.0);
        buffer
            .insert(TransformStamped::new(
                "map",
                "odom",
                101.0,
                translation(0.0, 0.0, 0.0),
            ))
            .unwrap();

        // map->odom stops at 101, odom->base_link at 102
        assert_eq!(buffer.latest_common_time("map", "base_link").unwrap(), 101.0);
        assert_eq!(buffer.latest_common_time("odom", "base_link").unwrap(), 102.0);
    }

    #[test]
    fn test_lookup_errors() {
        let mut buffer = moving_base(1.0);
        buffer
            .insert(TransformStamped::new(
                "world",
                "satellite",
                100.0,
                Transform::IDENTITY,
            ))
            .unwrap();

        assert!(matches!(
            buffer.lookup_transform("odom", "nowhere", LookupTime::Latest),
            Err(LookupError::UnknownFrame { frame }) if frame == "nowhere"
        ));
        assert!(matches!(
            buffer.lookup_transform("odom", "satellite", LookupTime::Latest),
            Err(LookupError::Disconnected { .. })
        ));
        assert!(matches!(
            buffer.lookup_transform("odom", "base_link", LookupTime::At(50.0)),
            Err(LookupError::ExtrapolationPast { .. })
        ));
        assert!(matches!(
            buffer.lookup_transform("odom", "base_link", LookupTime::At(150.0)),
            Err(LookupError::ExtrapolationFuture { .. })
        ));
    }

    #[test]
    fn test_insert_rejects_malformed_records() {
        let mut buffer = TransformBuffer::new();
        assert!(buffer
            .insert(TransformStamped::new("a", "a", 1.0, Transform::IDENTITY))
            .is_err());
        assert!(buffer
            .insert(TransformStamped::new("", "a", 1.0, Transform::IDENTITY))
            .is_err());

        let mut degenerate = TransformStamped::new("a", "b", 1.0, Transform::IDENTITY);
        degenerate.transform.rotation = contracts::Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert!(buffer.insert(degenerate).is_err());

        let nan = TransformStamped::new("a", "b", f64::NAN, Transform::IDENTITY);
        assert!(buffer.insert(nan).is_err());
    }

    #[test]
    fn test_reparent_replaces_history() {
        let mut buffer = moving_base(1.0);
        buffer
            .insert(TransformStamped::new(
                "map",
                "base_link",
                200.0,
                Transform::IDENTITY,
            ))
            .unwrap();

        assert_eq!(buffer.parent_of("base_link"), Some("map"));
        assert!(!buffer.can_transform("odom", "base_link", LookupTime::Latest));
    }

    #[test]
    fn test_twist_constant_linear_velocity() {
        let buffer = moving_base(1.5);

        let twist = buffer
            .lookup_twist("base_link", "odom", LookupTime::Latest, ONE_SECOND)
            .unwrap();

        assert_close(twist.linear, Vector3::new(1.5, 0.0, 0.0));
        assert_close(twist.angular, Vector3::ZERO);
    }

    #[test]
    fn test_twist_window_is_clamped_to_latest() {
        let buffer = moving_base(1.0);

        // Window would end at 101.5 + 0.5, clamped to 102 -> [101, 102]
        let twist = buffer
            .lookup_twist("base_link", "odom", LookupTime::At(101.5), ONE_SECOND)
            .unwrap();
        assert_close(twist.linear, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_twist_needs_a_full_window_of_history() {
        let mut buffer = TransformBuffer::new();
        buffer
            .insert(TransformStamped::new("odom", "base_link", 100.0, Transform::IDENTITY))
            .unwrap();

        assert!(matches!(
            buffer.lookup_twist("base_link", "odom", LookupTime::Latest, ONE_SECOND),
            Err(LookupError::ExtrapolationPast { .. })
        ));
    }

    #[test]
    fn test_twist_of_static_path_is_zero() {
        let mut buffer = TransformBuffer::new();
        buffer
            .insert(TransformStamped::new_static(
                "base_link",
                "laser",
                translation(1.0, 0.0, 0.0),
            ))
            .unwrap();

        let twist = buffer
            .lookup_twist("laser", "base_link", LookupTime::Latest, ONE_SECOND)
            .unwrap();
        assert_eq!(twist, Twist::ZERO);
    }

    #[test]
    fn test_twist_constant_yaw_rate() {
        let mut buffer = TransformBuffer::new();
        let yaw_rate = 0.4;
        for i in 0..=20 {
            let t = 10.0 + i as f64 * 0.1;
            let q = UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_rate * (t - 10.0));
            buffer
                .insert(TransformStamped::new("odom", "base_link", t, rotation(q)))
                .unwrap();
        }

        let twist = buffer
            .lookup_twist("base_link", "odom", LookupTime::Latest, ONE_SECOND)
            .unwrap();
        assert_close(twist.angular, Vector3::new(0.0, 0.0, yaw_rate));
        assert_close(twist.linear, Vector3::ZERO);
    }

    #[test]
    fn test_twist_random_axis_rotation() {
        let mut rng = rand::rng();
        for _ in 0..10 {
            let axis = NaVector3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if axis.norm() < 0.1 {
                continue;
            }
            let axis = axis.normalize();
            let rate = rng.random_range(0.1..1.5);
            let initial = UnitQuaternion::from_euler_angles(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );

            let mut buffer = TransformBuffer::new();
            for i in 0..=10 {
                let t = 5.0 + i as f64 * 0.2;
                // Constant angular velocity expressed in the observation frame
                let q = UnitQuaternion::from_scaled_axis(axis * rate * (t - 5.0)) * initial;
                buffer
                    .insert(TransformStamped::new("odom", "body", t, rotation(q)))
                    .unwrap();
            }

            let twist = buffer
                .lookup_twist("body", "odom", LookupTime::Latest, ONE_SECOND)
                .unwrap();
            assert_close(
                twist.angular,
                Vector3::new(axis.x * rate, axis.y * rate, axis.z * rate),
            );
        }
    }

    #[test]
    fn test_twist_of_identical_frames_is_zero() {
        let buffer = moving_base(1.0);
        let twist = buffer
            .lookup_twist("odom", "odom", LookupTime::Latest, ONE_SECOND)
            .unwrap();
        assert_eq!(twist, Twist::ZERO);
    }
}
