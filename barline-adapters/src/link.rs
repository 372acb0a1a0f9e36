//! Network link state from `/sys/class/net`.
//!
//! The link is read from the interface's `flags` (administratively up or
//! not) and `operstate` files. Addresses come from `ip -o addr`, the
//! wireless network name from `iwgetid -r`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError, PushProvider, UpdateSender};
use barline_types::{LinkInfo, LinkState, ProviderKind, RawValue};

use crate::command;
use crate::fs::read_trimmed;
use crate::AdapterError;

/// Default sysfs location of network interfaces.
pub const NET_ROOT: &str = "/sys/class/net";

const IFF_UP: u32 = 0x1;

/// How often the push provider re-reads the link.
pub const DEFAULT_LINK_CHECK: Duration = Duration::from_secs(1);

/// Which interface to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSelector {
    /// Exactly this interface.
    Name(String),
    /// The first interface (by name) starting with this prefix.
    Prefix(String),
    /// The first wireless interface.
    AnyWireless,
}

/// Reports the state of one network link.
///
/// Works both polled and as a push provider; in push mode it checks every
/// second and only sends when something changed.
#[derive(Debug, Clone)]
pub struct LinkStateProvider {
    root: PathBuf,
    selector: LinkSelector,
    check_every: Duration,
    run_commands: bool,
}

impl LinkStateProvider {
    pub fn new(selector: LinkSelector) -> Self {
        Self {
            root: PathBuf::from(NET_ROOT),
            selector,
            check_every: DEFAULT_LINK_CHECK,
            run_commands: true,
        }
    }

    /// Read interfaces from a different directory.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn check_every(mut self, interval: Duration) -> Self {
        self.check_every = interval;
        self
    }

    /// Skip `ip` and `iwgetid`; addresses and SSID stay empty.
    pub fn without_commands(mut self) -> Self {
        self.run_commands = false;
        self
    }

    async fn interfaces(&self) -> Result<Vec<String>, AdapterError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| AdapterError::io(&self.root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AdapterError::io(&self.root, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn select(&self) -> Result<Option<String>, AdapterError> {
        match &self.selector {
            LinkSelector::Name(name) => Ok(Some(name.clone())),
            LinkSelector::Prefix(prefix) => Ok(self
                .interfaces()
                .await?
                .into_iter()
                .find(|name| name.starts_with(prefix.as_str()))),
            LinkSelector::AnyWireless => {
                for name in self.interfaces().await? {
                    if is_wireless(&self.root.join(&name)).await {
                        return Ok(Some(name));
                    }
                }
                Ok(None)
            }
        }
    }

    fn selector_label(&self) -> String {
        match &self.selector {
            LinkSelector::Name(name) => name.clone(),
            LinkSelector::Prefix(prefix) => format!("{}*", prefix),
            LinkSelector::AnyWireless => "wireless".to_string(),
        }
    }

    /// Read the current link state. A missing interface is `Disabled`.
    pub async fn read(&self) -> Result<LinkInfo, AdapterError> {
        let Some(name) = self.select().await? else {
            return Ok(LinkInfo::new(self.selector_label(), LinkState::Disabled));
        };
        let dir = self.root.join(&name);

        let flags = match read_trimmed(&dir.join("flags")).await {
            Ok(flags) => parse_flags(&flags)?,
            Err(AdapterError::NotFound(_)) => {
                return Ok(LinkInfo::new(name, LinkState::Disabled));
            }
            Err(e) => return Err(e),
        };
        // The interface can vanish between the two reads
        let operstate = match read_trimmed(&dir.join("operstate")).await {
            Ok(operstate) => operstate,
            Err(AdapterError::NotFound(_)) => {
                return Ok(LinkInfo::new(name, LinkState::Disabled));
            }
            Err(e) => return Err(e),
        };

        let wireless = is_wireless(&dir).await;
        let (ips, ssid) = if self.run_commands && flags & IFF_UP != 0 {
            (addresses(&name).await, if wireless { ssid(&name).await } else { None })
        } else {
            (Vec::new(), None)
        };

        let mut info = LinkInfo::new(name, link_state(flags, &operstate, !ips.is_empty()));
        info.ips = ips;
        info.ssid = ssid;
        Ok(info)
    }
}

async fn is_wireless(dir: &Path) -> bool {
    tokio::fs::metadata(dir.join("wireless")).await.is_ok()
        || tokio::fs::metadata(dir.join("phy80211")).await.is_ok()
}

/// Parse the hex `flags` attribute (`0x1003`).
pub fn parse_flags(text: &str) -> Result<u32, AdapterError> {
    let hex = text.trim().trim_start_matches("0x");
    u32::from_str_radix(hex, 16).map_err(|_| AdapterError::parse("interface flags", text))
}

/// Decide the link state from its flags, operstate and whether it has an address.
pub fn link_state(flags: u32, operstate: &str, has_address: bool) -> LinkState {
    if flags & IFF_UP == 0 {
        return LinkState::Disabled;
    }
    match operstate {
        "up" | "unknown" if has_address => LinkState::Connected,
        "up" | "dormant" => LinkState::Connecting,
        _ => LinkState::Down,
    }
}

/// Extract addresses from `ip -o addr show dev <if>` output.
///
/// IPv4 addresses come first, link-local IPv6 addresses are skipped.
pub fn parse_ip_addr(output: &str) -> Vec<String> {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for line in output.lines() {
        let mut words = line.split_whitespace();
        while let Some(word) = words.next() {
            let family = match word {
                "inet" => &mut v4,
                "inet6" => &mut v6,
                _ => continue,
            };
            if let Some(cidr) = words.next() {
                let addr = cidr.split('/').next().unwrap_or(cidr);
                if !addr.starts_with("fe80:") {
                    family.push(addr.to_string());
                }
            }
            break;
        }
    }
    v4.extend(v6);
    v4
}

async fn addresses(name: &str) -> Vec<String> {
    match command::output("ip", &["-o", "addr", "show", "dev", name]).await {
        Ok(out) => parse_ip_addr(&out),
        Err(e) => {
            tracing::debug!(interface = name, error = %e, "could not list addresses");
            Vec::new()
        }
    }
}

async fn ssid(name: &str) -> Option<String> {
    match command::output("iwgetid", &["-r", name]).await {
        Ok(out) => Some(out.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => {
            tracing::debug!(interface = name, error = %e, "could not read ssid");
            None
        }
    }
}

#[async_trait]
impl Provider for LinkStateProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LinkState
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        Ok(RawValue::Link(self.read().await?))
    }
}

#[async_trait]
impl PushProvider for LinkStateProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LinkState
    }

    async fn run(&self, updates: UpdateSender) -> Result<(), ProviderError> {
        let mut last: Option<LinkInfo> = None;
        let mut ticker = tokio::time::interval(self.check_every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !updates.is_closed() {
            ticker.tick().await;
            let info = self.read().await?;
            if last.as_ref() != Some(&info) {
                last = Some(info.clone());
                if updates.send(RawValue::Link(info)).await.is_err() {
                    break;
                }
            }
        }
        Ok(())
    }
}
