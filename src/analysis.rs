//! Drives a per-method analysis over every member of a decoded class.

use tracing::{debug, warn};

use crate::error::{AnalysisError, MemberFailure};
use crate::expr::LValue;
use crate::method_info::MethodInfo;
use crate::ssa::SsaIdentifierFactory;
use crate::types::ClassFile;

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    /// Analyse nested classes before the members of their enclosing class.
    pub analyse_inner_classes: bool,
    /// Only analyse methods with this name.
    pub method_filter: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analyse_inner_classes: true,
            method_filter: None,
        }
    }
}

/// The per-method pass, e.g. bytecode lowering.
///
/// Each call receives an identifier factory that lives for that method only.
pub trait MethodAnalyser {
    fn analyse(
        &mut self,
        class: &ClassFile,
        method: &MethodInfo,
        ssa: &mut SsaIdentifierFactory<LValue>,
    ) -> anyhow::Result<()>;
}

impl<F> MethodAnalyser for F
where
    F: FnMut(&ClassFile, &MethodInfo, &mut SsaIdentifierFactory<LValue>) -> anyhow::Result<()>,
{
    fn analyse(
        &mut self,
        class: &ClassFile,
        method: &MethodInfo,
        ssa: &mut SsaIdentifierFactory<LValue>,
    ) -> anyhow::Result<()> {
        self(class, method, ssa)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ClassAnalyser {
    options: AnalysisOptions,
}

impl ClassAnalyser {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyse every selected method of `class`.
    ///
    /// A failing method does not stop the others; all failures are returned
    /// together once every member has been attempted.
    pub fn analyse(
        &self,
        class: &ClassFile,
        analyser: &mut dyn MethodAnalyser,
    ) -> Result<(), AnalysisError> {
        let mut failures = Vec::new();
        self.analyse_into(class, analyser, &mut failures);
        if failures.is_empty() {
            return Ok(());
        }
        Err(AnalysisError::MembersFailed {
            class_name: class.class_type().source_name(),
            failures,
        })
    }

    fn analyse_into(
        &self,
        class: &ClassFile,
        analyser: &mut dyn MethodAnalyser,
        failures: &mut Vec<MemberFailure>,
    ) {
        if self.options.analyse_inner_classes {
            for nested in class.inner_classes() {
                self.analyse_into(&nested.class, analyser, failures);
            }
        }

        for method in class.methods() {
            if let Some(filter) = &self.options.method_filter {
                if &method.name != filter {
                    continue;
                }
            }
            let mut ssa = SsaIdentifierFactory::new();
            match analyser.analyse(class, method, &mut ssa) {
                Ok(()) => debug!(
                    class = %class.class_type(),
                    method = %method.name,
                    "analysed method"
                ),
                Err(error) => {
                    warn!(
                        class = %class.class_type(),
                        method = %method.name,
                        descriptor = %method.descriptor,
                        error = %error,
                        "method analysis failed"
                    );
                    failures.push(MemberFailure {
                        class_name: class.class_type().source_name(),
                        method_name: method.name.clone(),
                        descriptor: method.descriptor.clone(),
                        error,
                    });
                }
            }
        }
    }
}
