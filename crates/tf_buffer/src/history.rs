//! Per-edge transform history with time-based eviction.
//!
//! Entries live in a bounded `HeapRb` kept sorted by stamp. Appends at the
//! newest end are O(1); the rare out-of-order insert rebuilds the ring.

use std::fmt;

use contracts::{ContractError, LookupError, TransformStamped};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use ringbuf::{traits::*, HeapRb};

/// Stamps closer than this are treated as identical
const STAMP_EPSILON: f64 = 1e-9;

/// History of a single parent -> child edge
pub struct TransformHistory {
    parent: String,
    entries: HeapRb<TransformStamped>,
    max_size: usize,
    cache_time: f64,
    is_static: bool,
    newest: Option<f64>,
    dropped_count: u64,
    out_of_order_count: u64,
}

impl fmt::Debug for TransformHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformHistory")
            .field("parent", &self.parent)
            .field("len", &self.entries.occupied_len())
            .field("static", &self.is_static)
            .field("newest", &self.newest)
            .finish()
    }
}

impl TransformHistory {
    /// Create an empty dynamic history
    pub fn new(parent: impl Into<String>, max_size: usize, cache_time: f64) -> Self {
        let max_size = max_size.max(1);
        Self {
            parent: parent.into(),
            entries: HeapRb::new(max_size),
            max_size,
            cache_time,
            is_static: false,
            newest: None,
            dropped_count: 0,
            out_of_order_count: 0,
        }
    }

    /// Parent frame of this edge
    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamp of the newest entry
    pub fn latest_stamp(&self) -> Option<f64> {
        self.newest
    }

    /// Stamp of the oldest entry
    pub fn earliest_stamp(&self) -> Option<f64> {
        self.entries.iter().next().map(TransformStamped::stamp)
    }

    /// Entries overwritten or evicted so far
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Entries that arrived older than the newest one
    pub fn out_of_order_count(&self) -> u64 {
        self.out_of_order_count
    }

    /// Insert a transform record
    ///
    /// A static record replaces the whole history and pins the edge as static.
    /// A dynamic record older than the eviction horizon is rejected.
    pub fn insert(&mut self, tf: TransformStamped) -> Result<(), ContractError> {
        if tf.is_static {
            self.dropped_count += self.entries.pop_iter().count() as u64;
            self.is_static = true;
            self.newest = Some(tf.stamp());
            let _ = self.entries.try_push(tf);
            return Ok(());
        }
        self.is_static = false;

        let stamp = tf.stamp();
        let Some(newest) = self.newest else {
            self.newest = Some(stamp);
            let _ = self.entries.try_push(tf);
            return Ok(());
        };

        if stamp < newest - self.cache_time {
            return Err(ContractError::transform_rejected(
                &self.parent,
                &tf.child_frame_id,
                format!(
                    "stamp {stamp:.6} is older than the {:.1}s history window ending at {newest:.6}",
                    self.cache_time
                ),
            ));
        }

        if stamp > newest + STAMP_EPSILON {
            self.push_newest(tf);
            self.newest = Some(stamp);
        } else {
            if stamp < newest - STAMP_EPSILON {
                self.out_of_order_count += 1;
            }
            self.insert_sorted(tf);
        }

        self.evict_expired();
        Ok(())
    }

    fn push_newest(&mut self, tf: TransformStamped) {
        if self.entries.is_full() {
            let _ = self.entries.try_pop();
            self.dropped_count += 1;
        }
        let _ = self.entries.try_push(tf);
    }

    fn insert_sorted(&mut self, tf: TransformStamped) {
        let stamp = tf.stamp();
        let mut entries: Vec<TransformStamped> = self.entries.pop_iter().collect();

        match entries
            .iter()
            .position(|e| e.stamp() >= stamp - STAMP_EPSILON)
        {
            Some(idx) if (entries[idx].stamp() - stamp).abs() <= STAMP_EPSILON => {
                entries[idx] = tf;
            }
            Some(idx) => entries.insert(idx, tf),
            None => entries.push(tf),
        }

        let overflow = entries.len().saturating_sub(self.max_size);
        self.dropped_count += overflow as u64;
        for entry in entries.into_iter().skip(overflow) {
            let _ = self.entries.try_push(entry);
        }
    }

    fn evict_expired(&mut self) {
        let Some(newest) = self.newest else {
            return;
        };
        let cutoff = newest - self.cache_time;
        while let Some(oldest) = self.earliest_stamp() {
            if oldest >= cutoff {
                break;
            }
            let _ = self.entries.try_pop();
            self.dropped_count += 1;
        }
    }

    /// Interpolated parent <- child transform at `at`
    ///
    /// Static edges ignore `at`. Dynamic edges interpolate between the two
    /// bracketing entries and refuse to extrapolate.
    pub fn sample(&self, at: f64) -> Result<Isometry3<f64>, LookupError> {
        let mut iter = self.entries.iter();
        let Some(first) = iter.next() else {
            return Err(LookupError::other(format!(
                "no transform data for edge under '{}'",
                self.parent
            )));
        };

        if self.is_static {
            return Ok(to_isometry(first));
        }

        if at < first.stamp() - STAMP_EPSILON {
            return Err(LookupError::ExtrapolationPast {
                requested: at,
                earliest: first.stamp(),
            });
        }

        let mut prev = first;
        if (at - prev.stamp()).abs() <= STAMP_EPSILON {
            return Ok(to_isometry(prev));
        }
        for next in iter {
            if (at - next.stamp()).abs() <= STAMP_EPSILON {
                return Ok(to_isometry(next));
            }
            if at < next.stamp() {
                let ratio = (at - prev.stamp()) / (next.stamp() - prev.stamp());
                return Ok(interpolate(&to_isometry(prev), &to_isometry(next), ratio));
            }
            prev = next;
        }

        Err(LookupError::ExtrapolationFuture {
            requested: at,
            latest: prev.stamp(),
        })
    }
}

/// Convert a transform record to a nalgebra isometry
pub(crate) fn to_isometry(tf: &TransformStamped) -> Isometry3<f64> {
    let t = &tf.transform.translation;
    let q = &tf.transform.rotation;
    Isometry3::from_parts(
        Translation3::new(t.x, t.y, t.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

/// Linear translation + spherical-linear rotation blend
fn interpolate(a: &Isometry3<f64>, b: &Isometry3<f64>, ratio: f64) -> Isometry3<f64> {
    let translation: Vector3<f64> = a.translation.vector.lerp(&b.translation.vector, ratio);
    let rotation = a
        .rotation
        .try_slerp(&b.rotation, ratio, 1e-12)
        .unwrap_or(a.rotation);
    Isometry3::from_parts(Translation3::from(translation), rotation)
}
