use crate::config::LauncherConfig;
use crate::host::Host;
use crate::platform::HostOs;
use crate::prompt::Prompter;

/// Everything an action needs: settings, the machine, and the user.
#[derive(Debug)]
pub struct LaunchContext<H, P> {
    pub config: LauncherConfig,
    pub host: H,
    pub prompter: P,
    pub os: HostOs,
}

impl<H: Host, P: Prompter> LaunchContext<H, P> {
    pub fn new(config: LauncherConfig, host: H, prompter: P) -> Self {
        Self {
            config,
            host,
            prompter,
            os: HostOs::current(),
        }
    }

    pub fn with_os(mut self, os: HostOs) -> Self {
        self.os = os;
        self
    }
}
