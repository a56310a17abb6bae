//! Conversion jobs and export delivery

use lattice_core::MeshFormat;
use uuid::Uuid;

/// One export request: created per call, discarded after delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionJob {
    pub id: Uuid,
    pub source: MeshFormat,
    pub target: MeshFormat,
}

impl ConversionJob {
    pub fn new(source: MeshFormat, target: MeshFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
        }
    }

    /// Wrap encoded bytes for delivery as `<basename>.<ext>`
    pub fn deliver(self, basename: &str, bytes: Vec<u8>) -> ExportFile {
        ExportFile {
            filename: format!("{basename}.{}", self.target.extension()),
            content_type: self.target.content_type(),
            bytes,
        }
    }
}

/// A named output byte buffer ready for the delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_names_follow_the_target_format() {
        let job = ConversionJob::new(MeshFormat::Obj, MeshFormat::Stl);
        let file = job.deliver("model", vec![1, 2, 3]);
        assert_eq!(file.filename, "model.stl");
        assert_eq!(file.content_type, "model/stl");
        assert_eq!(file.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn jobs_get_unique_ids() {
        let a = ConversionJob::new(MeshFormat::Obj, MeshFormat::Ply);
        let b = ConversionJob::new(MeshFormat::Obj, MeshFormat::Ply);
        assert_ne!(a.id, b.id);
    }
}
