// src/emitter/output.rs
//
// The output writer: ask the user emitter to render each source file in
// creation order and hand the contents to the host.

use super::{AssetEmitter, TypeEmitter};
use crate::entity::TargetValue;
use crate::errors::{EmitResult, EmitterError};
use crate::host::EmitterHost;
use crate::scope::SourceFileId;

/// What `source_file` renders for one created file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedSourceFile {
    pub path: String,
    pub contents: String,
}

impl<V: TargetValue> AssetEmitter<V> {
    pub fn write_output<E, H>(&mut self, e: &mut E, host: &mut H) -> EmitResult<()>
    where
        E: TypeEmitter<V> + ?Sized,
        H: EmitterHost,
    {
        self.drain_ready(e)?;
        tracing::trace!(files = self.scopes.file_count(), "writing output");
        for index in 0..self.scopes.file_count() {
            let id = SourceFileId::new(index as u32);
            let rendered = e.source_file(self, id)?;
            host.write_file(&rendered.path, &rendered.contents)
                .map_err(|source| EmitterError::Io {
                    path: rendered.path.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
