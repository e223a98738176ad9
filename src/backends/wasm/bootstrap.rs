// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{Display, Formatter};

use crate::config::WasmConfig;
use crate::errors::{BootstrapError, RuntimeFault};
use crate::observability::messages::bootstrap::{
    BootstrapFailed, BootstrapReady, ModuleInitialized, StageCompleted,
};
use crate::observability::messages::StructuredLog;
use crate::backends::wasm::runtime::LanguageRuntime;

/// Bootstrap progress. Each value names the last stage that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootstrapStage {
    Uninitialized,
    RuntimeModule,
    RuntimeGlobals,
    EvaluatorModules,
    InitializationMarked,
    SearchPath,
    SessionCreated,
}

impl BootstrapStage {
    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        use BootstrapStage::*;
        match self {
            Uninitialized => Some(RuntimeModule),
            RuntimeModule => Some(RuntimeGlobals),
            RuntimeGlobals => Some(EvaluatorModules),
            EvaluatorModules => Some(InitializationMarked),
            InitializationMarked => Some(SearchPath),
            SearchPath => Some(SessionCreated),
            SessionCreated => None,
        }
    }
}

impl Display for BootstrapStage {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            BootstrapStage::Uninitialized => "uninitialized",
            BootstrapStage::RuntimeModule => "runtime module",
            BootstrapStage::RuntimeGlobals => "runtime globals",
            BootstrapStage::EvaluatorModules => "evaluator modules",
            BootstrapStage::InitializationMarked => "end of initialization",
            BootstrapStage::SearchPath => "search path",
            BootstrapStage::SessionCreated => "session creation",
        };
        f.write_str(name)
    }
}

/// A fully bootstrapped runtime and its one session.
pub struct Bootstrapped<R: LanguageRuntime> {
    pub runtime: R,
    pub session: R::Session,
}

/// Linear bootstrap state machine. Consumes the runtime; it comes back
/// only inside [`Bootstrapped`].
pub struct Bootstrap<R> {
    runtime: R,
    stage: BootstrapStage,
    config: WasmConfig,
}

impl<R: LanguageRuntime> Bootstrap<R> {
    pub fn new(runtime: R, config: &WasmConfig) -> Self {
        Self {
            runtime,
            stage: BootstrapStage::Uninitialized,
            config: config.clone(),
        }
    }

    pub fn stage(&self) -> BootstrapStage {
        self.stage
    }

    /// Run every stage in order. Stops at the first failure.
    pub fn run(mut self) -> Result<Bootstrapped<R>, BootstrapError> {
        match self.run_stages() {
            Ok(session) => {
                BootstrapReady {
                    module_count: self.config.modules.len(),
                }
                .log();
                Ok(Bootstrapped {
                    runtime: self.runtime,
                    session,
                })
            }
            Err(error) => {
                BootstrapFailed {
                    stage: &error.stage().to_string(),
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }

    fn run_stages(&mut self) -> Result<R::Session, BootstrapError> {
        check_pointer_width(self.config.expected_pointer_width, host_pointer_width())?;

        self.enter(BootstrapStage::RuntimeModule, |rt, cfg| {
            rt.initialize_runtime_module(cfg.scheduler_workers)
        })?;
        self.enter(BootstrapStage::RuntimeGlobals, |rt, _| rt.initialize_globals())?;
        self.initialize_modules()?;
        self.enter(BootstrapStage::InitializationMarked, |rt, _| {
            rt.mark_end_initialization()
        })?;
        self.enter(BootstrapStage::SearchPath, |rt, _| rt.initialize_search_path())?;

        let session = self
            .runtime
            .create_session()
            .map_err(|fault| BootstrapError::Stage {
                stage: BootstrapStage::SessionCreated,
                fault,
            })?;
        self.completed(BootstrapStage::SessionCreated);
        Ok(session)
    }

    fn enter<F>(&mut self, stage: BootstrapStage, step: F) -> Result<(), BootstrapError>
    where
        F: FnOnce(&mut R, &WasmConfig) -> Result<(), RuntimeFault>,
    {
        debug_assert_eq!(self.stage.next(), Some(stage));
        step(&mut self.runtime, &self.config)
            .map_err(|fault| BootstrapError::Stage { stage, fault })?;
        self.completed(stage);
        Ok(())
    }

    fn initialize_modules(&mut self) -> Result<(), BootstrapError> {
        let total = self.config.modules.len();
        for (index, module) in self.config.modules.iter().enumerate() {
            self.runtime
                .initialize_module(module)
                .map_err(|fault| BootstrapError::Module {
                    module: module.clone(),
                    fault,
                })?;
            ModuleInitialized {
                module,
                position: index + 1,
                total,
            }
            .log();
        }
        self.completed(BootstrapStage::EvaluatorModules);
        Ok(())
    }

    fn completed(&mut self, stage: BootstrapStage) {
        self.stage = stage;
        StageCompleted {
            stage: &stage.to_string(),
        }
        .log();
    }
}

pub fn host_pointer_width() -> u32 {
    usize::BITS
}

fn check_pointer_width(expected: u32, actual: u32) -> Result<(), BootstrapError> {
    if expected == actual {
        Ok(())
    } else {
        Err(BootstrapError::PointerWidth { expected, actual })
    }
}
