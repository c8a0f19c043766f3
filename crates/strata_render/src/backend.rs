//! Backend interface
//!
//! A backend owns render targets and executes draw commands. Strata never
//! talks to a GPU API itself; it drives a [`Backend`] depth-first, children
//! before parents.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::command::DrawCommand;
use crate::effect::LayerEffect;
use crate::error::BackendError;

/// Handle to an offscreen target owned by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

/// Target dimensions in device pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Device size of a canvas, rounded up and at least one pixel
    pub fn from_canvas(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        let px = |v: f32| (v * device_pixel_ratio).ceil().max(1.0) as u32;
        Self::new(px(width), px(height))
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Pixel format of a render target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    #[default]
    Rgba8,
    Rgba16Float,
}

/// Executes draw commands
pub trait Backend {
    /// Allocate an offscreen target
    fn create_target(
        &mut self,
        size: TargetSize,
        format: TargetFormat,
    ) -> Result<TargetId, BackendError>;

    /// Bind and clear a target; `None` is the externally supplied root target
    fn begin_target(&mut self, target: Option<TargetId>) -> Result<(), BackendError>;

    /// Draw into the bound target
    fn submit(&mut self, commands: &[DrawCommand]) -> Result<(), BackendError>;

    /// Finish the bound target, applying `effect` to its contents
    fn end_target(
        &mut self,
        target: Option<TargetId>,
        effect: Option<&LayerEffect>,
    ) -> Result<(), BackendError>;

    fn destroy_target(&mut self, target: TargetId) -> Result<(), BackendError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording backend
// ─────────────────────────────────────────────────────────────────────────────

/// One call received by a [`RecordingBackend`]
#[derive(Clone, Debug, PartialEq)]
pub enum BackendEvent {
    CreateTarget {
        id: TargetId,
        size: TargetSize,
        format: TargetFormat,
    },
    BeginTarget(Option<TargetId>),
    Submit(Vec<DrawCommand>),
    EndTarget {
        target: Option<TargetId>,
        effect: Option<LayerEffect>,
    },
    DestroyTarget(TargetId),
}

/// Backend that records every call instead of drawing
///
/// Rejects ids it never handed out, which makes target lifetime mistakes
/// visible in tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    events: Vec<BackendEvent>,
    live: FxHashSet<TargetId>,
    next_id: u64,
    target_limit: Option<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail allocations beyond `limit` live targets
    pub fn with_target_limit(mut self, limit: usize) -> Self {
        self.target_limit = Some(limit);
        self
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn live_targets(&self) -> usize {
        self.live.len()
    }

    /// Every submitted command, in submission order
    pub fn submitted(&self) -> impl Iterator<Item = &DrawCommand> {
        self.events.iter().flat_map(|event| match event {
            BackendEvent::Submit(commands) => commands.as_slice(),
            _ => &[],
        })
    }

    pub fn created_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BackendEvent::CreateTarget { .. }))
            .count()
    }

    fn check(&self, target: Option<TargetId>) -> Result<(), BackendError> {
        match target {
            Some(id) if !self.live.contains(&id) => Err(BackendError::UnknownTarget(id.0)),
            _ => Ok(()),
        }
    }
}

impl Backend for RecordingBackend {
    fn create_target(
        &mut self,
        size: TargetSize,
        format: TargetFormat,
    ) -> Result<TargetId, BackendError> {
        if let Some(limit) = self.target_limit {
            if self.live.len() >= limit {
                return Err(BackendError::TargetAllocation(format!(
                    "limit of {} live targets reached",
                    limit
                )));
            }
        }
        self.next_id += 1;
        let id = TargetId(self.next_id);
        self.live.insert(id);
        self.events.push(BackendEvent::CreateTarget { id, size, format });
        Ok(id)
    }

    fn begin_target(&mut self, target: Option<TargetId>) -> Result<(), BackendError> {
        self.check(target)?;
        self.events.push(BackendEvent::BeginTarget(target));
        Ok(())
    }

    fn submit(&mut self, commands: &[DrawCommand]) -> Result<(), BackendError> {
        self.events.push(BackendEvent::Submit(commands.to_vec()));
        Ok(())
    }

    fn end_target(
        &mut self,
        target: Option<TargetId>,
        effect: Option<&LayerEffect>,
    ) -> Result<(), BackendError> {
        self.check(target)?;
        self.events.push(BackendEvent::EndTarget {
            target,
            effect: effect.cloned(),
        });
        Ok(())
    }

    fn destroy_target(&mut self, target: TargetId) -> Result<(), BackendError> {
        if !self.live.remove(&target) {
            return Err(BackendError::UnknownTarget(target.0));
        }
        self.events.push(BackendEvent::DestroyTarget(target));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_size_from_canvas() {
        assert_eq!(
            TargetSize::from_canvas(100.5, 50.0, 2.0),
            TargetSize::new(201, 100)
        );
        assert_eq!(TargetSize::from_canvas(0.0, 0.0, 1.0), TargetSize::new(1, 1));
    }

    #[test]
    fn test_recording_lifecycle() {
        let mut backend = RecordingBackend::new();
        let id = backend
            .create_target(TargetSize::new(4, 4), TargetFormat::Rgba8)
            .unwrap();
        backend.begin_target(Some(id)).unwrap();
        backend.submit(&[]).unwrap();
        backend.end_target(Some(id), None).unwrap();
        backend.destroy_target(id).unwrap();

        assert_eq!(backend.events().len(), 5);
        assert_eq!(backend.live_targets(), 0);
        assert_eq!(backend.created_count(), 1);
        assert_eq!(backend.submitted().count(), 0);
    }

    #[test]
    fn test_unknown_target_rejected() {
        let mut backend = RecordingBackend::new();
        assert_eq!(
            backend.begin_target(Some(TargetId(9))),
            Err(BackendError::UnknownTarget(9))
        );
        assert!(backend.destroy_target(TargetId(9)).is_err());
        assert!(backend.begin_target(None).is_ok());
    }

    #[test]
    fn test_target_limit() {
        let mut backend = RecordingBackend::new().with_target_limit(1);
        let size = TargetSize::new(1, 1);
        assert!(backend.create_target(size, TargetFormat::Rgba8).is_ok());
        assert!(matches!(
            backend.create_target(size, TargetFormat::Rgba8),
            Err(BackendError::TargetAllocation(_))
        ));
    }
}
