use crate::error::Result;
use crate::output::OutputManager;
use loadinject::{HarnessConfig, InjectorRegistry};

pub fn run(config: &HarnessConfig, output: &OutputManager) -> Result<()> {
    let registry = InjectorRegistry::with_builtin(config.injector.clone());
    output.print_aliases(&registry.aliases())
}
