//! Outcome Collector
//!
//! Pulls one concrete value per concolic input out of an explored state.

use ctc_config::{Configuration, InputKind};

use crate::binding::{BoundInputs, SimFile};
use crate::engine::Engine;
use crate::error::{CollectError, EngineError, EngineResult};

/// Concrete value of one concolic input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedValue {
    pub kind: InputKind,
    /// Name recorded in the test case
    pub element_name: String,
    /// Declared width in bytes
    pub declared_size: usize,
    /// Value as the engine produced it, not yet normalized
    pub value: Vec<u8>,
}

/// Concrete values of one explored state, in record order
///
/// Symbolic arguments in argv order, then files in declaration order, then
/// stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub values: Vec<CollectedValue>,
}

impl Outcome {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by recorded name
    #[must_use]
    pub fn get(&self, element_name: &str) -> Option<&CollectedValue> {
        self.values.iter().find(|v| v.element_name == element_name)
    }
}

/// Collect concrete values for every concolic input of `config`
///
/// # Errors
/// Returns `UnresolvedInput` for the first input the engine cannot resolve,
/// which is scoped to this state. Returns `Engine` if the engine itself
/// failed, which no later state can recover from.
pub fn collect<E: Engine>(
    engine: &mut E,
    state: &E::State,
    config: &Configuration,
    bound: &BoundInputs,
) -> Result<Outcome, CollectError> {
    let mut values = Vec::with_capacity(config.concolic_input_count());

    for (decl, symbol) in config.symbolic_arguments().zip(bound.symbolic_args()) {
        let value = engine
            .solve_concrete(state, symbol)
            .map_err(|e| query_failed(decl.name(), e))?;
        values.push(CollectedValue {
            kind: InputKind::Argument,
            element_name: decl.element_name().to_string(),
            declared_size: decl.size(),
            value,
        });
    }

    for (decl, file) in config.files().iter().zip(&bound.files) {
        let value = file_content(engine, state, file)
            .map_err(|e| query_failed(decl.name(), e))?;
        values.push(CollectedValue {
            kind: InputKind::File,
            element_name: decl.element_name().to_string(),
            declared_size: decl.size(),
            value,
        });
    }

    if let (Some(decl), Some(file)) = (config.stdin(), &bound.stdin) {
        let value = file_content(engine, state, file)
            .map_err(|e| query_failed(decl.name(), e))?;
        values.push(CollectedValue {
            kind: InputKind::StandardInput,
            element_name: decl.element_name().to_string(),
            declared_size: decl.size(),
            value,
        });
    }

    Ok(Outcome { values })
}

fn query_failed(name: &str, error: EngineError) -> CollectError {
    if error.is_outcome_scoped() {
        CollectError::unresolved(name, error)
    } else {
        CollectError::Engine(error)
    }
}

/// Content of a file-like object, by descriptor when the state opened it
///
/// Not every symbolic file is opened on every path, so a missing descriptor
/// falls back to addressing the file by path.
fn file_content<E: Engine>(engine: &mut E, state: &E::State, file: &SimFile) -> EngineResult<Vec<u8>> {
    match engine.lookup_fd(state, file.path())? {
        Some(fd) => {
            tracing::debug!("fd {} found for {}", fd.0, file.path());
            engine.dump_by_descriptor(state, fd)
        }
        None => {
            tracing::debug!("no fd found, dumping by path: {}", file.path());
            engine.dump_by_path(state, file.path())
        }
    }
}
