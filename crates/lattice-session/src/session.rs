//! The single live scene and its command boundaries

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lattice_core::{MeshFormat, Scene};
use lattice_view::{normalize, CameraCommand, CameraState, Framing, OrbitCamera};
use parking_lot::Mutex;
use tokio::task;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::export::{ConversionJob, ExportFile};

/// The live scene with its navigation state. Replaced wholesale on load,
/// never mutated field-by-field.
struct LiveScene {
    scene: Arc<Scene>,
    camera: OrbitCamera,
    source_format: MeshFormat,
    basename: String,
}

/// Summary of a freshly installed scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSummary {
    pub source_format: MeshFormat,
    pub mesh_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub camera: CameraState,
}

/// Outcome of one load request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// The decoded scene replaced the live scene
    Loaded(SceneSummary),
    /// A newer load was requested while this one was in flight; its
    /// result was discarded and the live scene is untouched
    Superseded,
}

/// One viewing/conversion session.
///
/// Holds at most one live scene. Loads run decode and normalization off
/// the caller's thread and install the result atomically; only the most
/// recently requested load may replace the live scene. Camera commands
/// are serialized through the lock; exports clone the scene handle and
/// never observe a torn scene.
#[derive(Default)]
pub struct Session {
    live: Mutex<Option<LiveScene>>,
    load_epoch: AtomicU64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a load has succeeded and not been replaced by a failure
    pub fn is_loaded(&self) -> bool {
        self.live.lock().is_some()
    }

    /// Decode and normalize `bytes`, then atomically install the result
    /// as the live scene. The format tag is validated before any decoder
    /// runs. A failed decode leaves the previous scene, if any, untouched.
    pub async fn load(
        &self,
        bytes: Vec<u8>,
        tag: &str,
        basename: &str,
    ) -> Result<LoadOutcome, SessionError> {
        let format = MeshFormat::parse_tag(tag)?;
        let epoch = self.begin_load();

        let (scene, framing) = task::spawn_blocking(move || {
            let mut scene = lattice_formats::decode(&bytes, format)?;
            let framing = normalize(&mut scene);
            Ok::<_, SessionError>((scene, framing))
        })
        .await
        .map_err(|e| SessionError::Task(e.to_string()))??;

        Ok(self.complete_load(epoch, scene, framing, format, basename))
    }

    /// Stamp a new load request. Any load begun earlier becomes stale.
    fn begin_load(&self) -> u64 {
        self.load_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install a decoded scene unless a newer load has been requested
    fn complete_load(
        &self,
        epoch: u64,
        scene: Scene,
        framing: Framing,
        format: MeshFormat,
        basename: &str,
    ) -> LoadOutcome {
        let mut live = self.live.lock();
        if self.load_epoch.load(Ordering::SeqCst) != epoch {
            debug!(epoch, "discarding stale load completion");
            return LoadOutcome::Superseded;
        }

        let summary = SceneSummary {
            source_format: format,
            mesh_count: scene.meshes.len(),
            vertex_count: scene.vertex_count(),
            triangle_count: scene.triangle_count(),
            camera: framing.camera.state(),
        };
        info!(
            format = %format,
            meshes = summary.mesh_count,
            vertices = summary.vertex_count,
            triangles = summary.triangle_count,
            "installed live scene"
        );
        *live = Some(LiveScene {
            scene: Arc::new(scene),
            camera: framing.camera,
            source_format: format,
            basename: basename.to_string(),
        });
        LoadOutcome::Loaded(summary)
    }

    /// Apply one navigation command and return the updated camera state
    pub fn camera(&self, command: CameraCommand) -> Result<CameraState, SessionError> {
        let mut live = self.live.lock();
        let live = live.as_mut().ok_or(SessionError::NoSceneLoaded)?;
        live.camera.apply(command);
        Ok(live.camera.state())
    }

    /// Current camera state without applying a command
    pub fn camera_state(&self) -> Result<CameraState, SessionError> {
        let live = self.live.lock();
        let live = live.as_ref().ok_or(SessionError::NoSceneLoaded)?;
        Ok(live.camera.state())
    }

    /// Encode the live scene into the target format. Converting to the
    /// scene's own source format is a declared user error, rejected
    /// before any encoder runs.
    pub async fn export(&self, tag: &str) -> Result<ExportFile, SessionError> {
        let format = MeshFormat::parse_tag(tag)?;

        let (scene, source_format, basename) = {
            let live = self.live.lock();
            let live = live.as_ref().ok_or(SessionError::NoSceneLoaded)?;
            (
                Arc::clone(&live.scene),
                live.source_format,
                live.basename.clone(),
            )
        };

        if source_format == format {
            return Err(SessionError::RedundantConversion(format));
        }

        let job = ConversionJob::new(source_format, format);
        debug!(job = %job.id, from = %source_format, to = %format, "export started");

        let bytes = task::spawn_blocking(move || lattice_formats::encode(&scene, format))
            .await
            .map_err(|e| SessionError::Task(e.to_string()))??;

        debug!(job = %job.id, len = bytes.len(), "export finished");
        Ok(job.deliver(&basename, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 2 0 0
v 0 2 0
f 1 2 3
";

    fn obj_bytes() -> Vec<u8> {
        TRIANGLE_OBJ.as_bytes().to_vec()
    }

    #[tokio::test]
    async fn camera_before_load_is_rejected() {
        let session = Session::new();
        assert!(matches!(
            session.camera(CameraCommand::ZoomIn),
            Err(SessionError::NoSceneLoaded)
        ));
        assert!(matches!(
            session.export("stl").await,
            Err(SessionError::NoSceneLoaded)
        ));
    }

    #[tokio::test]
    async fn load_installs_a_normalized_scene() {
        let session = Session::new();
        let outcome = session.load(obj_bytes(), "obj", "tri").await.unwrap();
        let LoadOutcome::Loaded(summary) = outcome else {
            panic!("expected Loaded");
        };
        assert_eq!(summary.source_format, MeshFormat::Obj);
        assert_eq!(summary.vertex_count, 3);
        assert_eq!(summary.triangle_count, 1);
        // Normalization ran before the first framing: the orbit pivot is
        // the origin.
        assert_eq!(summary.camera.target, lattice_core::Vec3::ZERO);
        assert!(session.is_loaded());
    }

    #[tokio::test]
    async fn unknown_tag_is_rejected_before_decoding() {
        let session = Session::new();
        let err = session.load(b"garbage".to_vec(), "fbx", "x").await.unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedFormat(_)));
        assert!(!session.is_loaded());
    }

    #[tokio::test]
    async fn camera_commands_mutate_the_live_state() {
        let session = Session::new();
        session.load(obj_bytes(), "obj", "tri").await.unwrap();

        let before = session.camera_state().unwrap();
        let after = session.camera(CameraCommand::ZoomIn).unwrap();
        let shrank = (after.position - after.target).length()
            < (before.position - before.target).length();
        assert!(shrank);
        assert_eq!(after.up, before.up);
    }

    #[tokio::test]
    async fn redundant_conversion_is_rejected() {
        let session = Session::new();
        session.load(obj_bytes(), "obj", "tri").await.unwrap();
        // Tags are compared case-insensitively at the boundary.
        let err = session.export("OBJ").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::RedundantConversion(MeshFormat::Obj)
        ));
    }

    #[tokio::test]
    async fn export_delivers_named_bytes() {
        let session = Session::new();
        session.load(obj_bytes(), "obj", "model").await.unwrap();

        let file = session.export("stl").await.unwrap();
        assert_eq!(file.filename, "model.stl");
        assert_eq!(file.content_type, "model/stl");
        // One 50-byte record after the 84-byte header.
        assert_eq!(file.bytes.len(), 84 + 50);

        let file = session.export("ply").await.unwrap();
        assert_eq!(file.filename, "model.ply");
        assert_eq!(file.content_type, "text/plain");
    }

    #[tokio::test]
    async fn failed_load_leaves_previous_scene_live() {
        let session = Session::new();
        session.load(obj_bytes(), "obj", "first").await.unwrap();

        // Invalid UTF-8 cannot decode as OBJ.
        let err = session.load(vec![0xff, 0xfe], "obj", "second").await;
        assert!(matches!(err, Err(SessionError::Decode(_))));

        let file = session.export("stl").await.unwrap();
        assert_eq!(file.filename, "first.stl");
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let session = Session::new();

        // Two loads in flight; the older epoch completes last.
        let first = session.begin_load();
        let second = session.begin_load();

        let mut scene_b = lattice_formats::decode(&obj_bytes(), MeshFormat::Obj).unwrap();
        let framing_b = normalize(&mut scene_b);
        let outcome = session.complete_load(second, scene_b, framing_b, MeshFormat::Obj, "new");
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));

        let mut scene_a = lattice_formats::decode(&obj_bytes(), MeshFormat::Obj).unwrap();
        let framing_a = normalize(&mut scene_a);
        let outcome = session.complete_load(first, scene_a, framing_a, MeshFormat::Obj, "old");
        assert!(matches!(outcome, LoadOutcome::Superseded));

        // The stale result was discarded, not applied.
        let file = session.export("stl").await.unwrap();
        assert_eq!(file.filename, "new.stl");
    }

    #[tokio::test]
    async fn concurrent_loads_settle_on_the_newest_request() {
        let session = Session::new();
        let a = session.load(obj_bytes(), "obj", "first");
        let b = session.load(obj_bytes(), "obj", "second");
        let (a, b) = tokio::join!(a, b);
        a.unwrap();
        assert!(matches!(b.unwrap(), LoadOutcome::Loaded(_)));

        let file = session.export("stl").await.unwrap();
        assert_eq!(file.filename, "second.stl");
    }
}
