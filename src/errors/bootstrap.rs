// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for the WASM runtime bootstrap.

use crate::backends::wasm::BootstrapStage;
use thiserror::Error;

/// A single call into the embedded language runtime reported failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RuntimeFault(pub String);

impl RuntimeFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Bootstrap aborted. Carries the stage that failed and, for evaluator
/// module initialisation, which module it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// The host pointer width does not match the width the compiled
    /// module data was produced for.
    #[error("Pointer width mismatch: runtime built for {expected}-bit pointers, host has {actual}-bit")]
    PointerWidth { expected: u32, actual: u32 },

    /// A runtime-level stage failed.
    #[error("Bootstrap failed at stage {stage}: {fault}")]
    Stage {
        stage: BootstrapStage,
        #[source]
        fault: RuntimeFault,
    },

    /// An evaluator module failed to initialise.
    #[error("Failed to initialize evaluator module '{module}': {fault}")]
    Module {
        module: String,
        #[source]
        fault: RuntimeFault,
    },
}

impl BootstrapError {
    /// The stage at which bootstrap stopped.
    pub fn stage(&self) -> BootstrapStage {
        match self {
            BootstrapError::PointerWidth { .. } => BootstrapStage::Uninitialized,
            BootstrapError::Stage { stage, .. } => *stage,
            BootstrapError::Module { .. } => BootstrapStage::EvaluatorModules,
        }
    }
}
