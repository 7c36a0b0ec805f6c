//! Text command dispatch.
//!
//! Turns a raw chat message into one probe and one reply. Every input gets
//! an answer: malformed commands get the matching usage line, anything
//! unrecognised gets a polite shrug.

use crate::config::ProbeSettings;
use crate::output::reply;
use crate::scanner::{
    Connector, EchoProbe, IcmpEcho, Pinger, PortScanner, ScanRequest, ScanResult, TcpConnector,
    TcpPinger,
};
use crate::types::{parse_port, Port, PortError, PortRange, ProbeTarget};
use std::sync::Arc;
use tracing::{info, warn};

/// Which of the two (equivalent) scan keywords was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKeyword {
    /// `端口测试`
    PortTest,
    /// `端口扫描`
    PortScan,
}

impl ScanKeyword {
    fn usage(self) -> Usage {
        match self {
            Self::PortTest => Usage::PortTest,
            Self::PortScan => Usage::PortScan,
        }
    }
}

/// A parsed text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `ping <host>`
    Ping { host: String },
    /// `tcping <host> [<port>]`
    TcpPing(ProbeTarget),
    /// `端口测试|端口扫描 <host> [<start>] [<end>]`
    Scan {
        keyword: ScanKeyword,
        host: String,
        start: Option<Port>,
        end: Option<Port>,
    },
    /// Anything else.
    Unknown(String),
}

/// A recognised command with unusable arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Ping,
    TcpPing,
    PortTest,
    PortScan,
}

impl Usage {
    pub fn message(self) -> &'static str {
        match self {
            Self::Ping => reply::PING_USAGE,
            Self::TcpPing => reply::TCPING_USAGE,
            Self::PortTest => reply::PORT_TEST_USAGE,
            Self::PortScan => reply::PORT_SCAN_USAGE,
        }
    }
}

// Longest keyword first so "tcping" is not read as "ping".
const KEYWORDS: [&str; 4] = ["tcping", "ping", "端口测试", "端口扫描"];

impl Command {
    /// Parse a raw message.
    pub fn parse(text: &str) -> Result<Self, Usage> {
        let content = normalize(text);

        let Some((keyword, rest)) = KEYWORDS
            .iter()
            .find_map(|kw| content.strip_prefix(*kw).map(|rest| (*kw, rest)))
        else {
            return Ok(Self::Unknown(content));
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match keyword {
            // The whole remainder is the host; the prober rejects junk.
            "ping" => match rest.trim() {
                "" => Err(Usage::Ping),
                host => Ok(Self::Ping {
                    host: host.to_string(),
                }),
            },
            "tcping" => {
                let host = args.first().ok_or(Usage::TcpPing)?;
                let port = optional_port(args.get(1)).map_err(|_| Usage::TcpPing)?;
                let target = ProbeTarget::new(*host, port).map_err(|_| Usage::TcpPing)?;
                Ok(Self::TcpPing(target))
            }
            "端口测试" => parse_scan(ScanKeyword::PortTest, &args),
            _ => parse_scan(ScanKeyword::PortScan, &args),
        }
    }
}

fn parse_scan(keyword: ScanKeyword, args: &[&str]) -> Result<Command, Usage> {
    let usage = keyword.usage();
    let host = args.first().ok_or(usage)?;
    ProbeTarget::new(*host, None).map_err(|_| usage)?;

    Ok(Command::Scan {
        keyword,
        host: (*host).to_string(),
        start: optional_port(args.get(1)).map_err(|_| usage)?,
        end: optional_port(args.get(2)).map_err(|_| usage)?,
    })
}

fn optional_port(arg: Option<&&str>) -> Result<Option<Port>, PortError> {
    arg.map(|s| parse_port(s)).transpose()
}

/// Strip `<@123>` / `<@!123>` mentions, surrounding whitespace and one
/// leading `/`.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find("<@") {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx + 2..];
        let body = tail.strip_prefix('!').unwrap_or(tail);
        let digits = body.len() - body.trim_start_matches(|c: char| c.is_ascii_digit()).len();

        if digits > 0 && body[digits..].starts_with('>') {
            rest = &body[digits + 1..];
        } else {
            out.push_str("<@");
            rest = tail;
        }
    }
    out.push_str(rest);

    let trimmed = out.trim();
    trimmed
        .strip_prefix('/')
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}

/// Routes text commands to the probers.
pub struct Dispatcher<C, E> {
    tcp: TcpPinger<C>,
    pinger: Pinger<E>,
    scanner: PortScanner<C>,
    settings: ProbeSettings,
}

impl Dispatcher<TcpConnector, IcmpEcho> {
    /// Dispatcher wired to real sockets.
    pub fn from_settings(settings: ProbeSettings) -> Self {
        Self::new(Arc::new(TcpConnector::new()), Arc::new(IcmpEcho::new()), settings)
    }
}

impl<C: Connector, E: EchoProbe> Dispatcher<C, E> {
    pub fn new(connector: Arc<C>, echo: Arc<E>, settings: ProbeSettings) -> Self {
        let tcp = TcpPinger::new(Arc::clone(&connector))
            .with_default_port(settings.tcp_ping_port)
            .with_timeout(settings.tcp_ping_timeout());

        let mut pinger = Pinger::new(echo).with_timeout(settings.ping_timeout());
        if let Some(port) = settings.ping_fallback_port {
            let fallback: Arc<dyn Connector> = connector.clone();
            pinger = pinger.with_fallback(fallback, port);
        }

        Self {
            tcp,
            pinger,
            scanner: PortScanner::new(connector),
            settings,
        }
    }

    /// Answer one raw message.
    pub async fn handle(&self, text: &str) -> String {
        let reply = match Command::parse(text) {
            Ok(command) => self.execute(command).await,
            Err(usage) => {
                warn!("malformed command: {}", text.trim());
                usage.message().to_string()
            }
        };
        info!("reply: {}", reply);
        reply
    }

    /// Run a parsed command.
    pub async fn execute(&self, command: Command) -> String {
        match command {
            Command::Ping { host } => self.pinger.ping(&host).await,
            Command::TcpPing(target) => self.tcp.tcp_ping(&target).await,
            Command::Scan {
                keyword,
                host,
                start,
                end,
            } => self.scan(keyword, host, start, end).await,
            Command::Unknown(content) => {
                warn!("unrecognised request: {}", content);
                reply::UNKNOWN_COMMAND.to_string()
            }
        }
    }

    async fn scan(
        &self,
        keyword: ScanKeyword,
        host: String,
        start: Option<Port>,
        end: Option<Port>,
    ) -> String {
        let range = PortRange::new(
            start.unwrap_or(self.settings.scan_default_start),
            end.unwrap_or(self.settings.scan_default_end),
        );
        let request = match ScanRequest::for_range(host, range)
            .and_then(|r| r.with_concurrency(self.settings.scan_concurrency))
        {
            Ok(r) => r.with_timeout(self.settings.scan_port_timeout()),
            Err(e) => {
                warn!("rejected scan: {}", e);
                return keyword.usage().message().to_string();
            }
        };

        match self.scanner.scan(&request).await {
            Ok(result) => reply::scan(&result),
            Err(e) if e.is_invalid_input() => {
                warn!("rejected scan of {}: {}", request.host(), e);
                keyword.usage().message().to_string()
            }
            Err(e) => {
                // Unresolvable hosts have no reachable ports.
                warn!("scan of {} failed: {}", request.host(), e);
                reply::scan(&ScanResult::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ProbeOutcome, UnreachableReason};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::net::{IpAddr, SocketAddr};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeNet {
        open: HashSet<u16>,
        probed: Mutex<Vec<u16>>,
    }

    #[async_trait]
    impl Connector for FakeNet {
        async fn connect(&self, addr: SocketAddr, _timeout: Duration) -> ProbeOutcome {
            self.probed.lock().unwrap().push(addr.port());
            if self.open.contains(&addr.port()) {
                ProbeOutcome::success(Duration::from_millis(2))
            } else {
                ProbeOutcome::unreachable(UnreachableReason::Refused)
            }
        }
    }

    struct SilentEcho;

    #[async_trait]
    impl EchoProbe for SilentEcho {
        async fn echo(&self, _addr: IpAddr, _timeout: Duration) -> ProbeOutcome {
            ProbeOutcome::unreachable(UnreachableReason::TimedOut)
        }
    }

    fn dispatcher(open: &[u16]) -> (Arc<FakeNet>, Dispatcher<FakeNet, SilentEcho>) {
        let net = Arc::new(FakeNet {
            open: open.iter().copied().collect(),
            ..FakeNet::default()
        });
        let dispatcher =
            Dispatcher::new(Arc::clone(&net), Arc::new(SilentEcho), ProbeSettings::default());
        (net, dispatcher)
    }

    #[test]
    fn test_normalize_strips_mentions_and_slash() {
        assert_eq!(normalize("<@!12345> /ping example.com"), "ping example.com");
        assert_eq!(normalize("<@99>tcping a.com 22 "), "tcping a.com 22");
        assert_eq!(normalize("<@abc> hi"), "<@abc> hi");
        assert_eq!(normalize("  端口扫描 a.com  "), "端口扫描 a.com");
    }

    #[test]
    fn test_parse_ping() {
        assert_eq!(
            Command::parse("ping example.com"),
            Ok(Command::Ping {
                host: "example.com".to_string()
            })
        );
        assert_eq!(Command::parse("ping"), Err(Usage::Ping));
        assert_eq!(
            Command::parse("ping a.com b.com"),
            Ok(Command::Ping {
                host: "a.com b.com".to_string()
            })
        );
    }

    #[test]
    fn test_parse_tcping() {
        let Ok(Command::TcpPing(target)) = Command::parse("tcping example.com 8080") else {
            panic!("expected tcping");
        };
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, Port::new(8080));

        let Ok(Command::TcpPing(target)) = Command::parse("tcping example.com") else {
            panic!("expected tcping");
        };
        assert_eq!(target.port, None);

        assert_eq!(Command::parse("tcping"), Err(Usage::TcpPing));
        assert_eq!(Command::parse("tcping example.com http"), Err(Usage::TcpPing));
        assert_eq!(Command::parse("tcping example.com 0"), Err(Usage::TcpPing));
        assert_eq!(Command::parse("tcping example.com 65536"), Err(Usage::TcpPing));
    }

    #[test]
    fn test_parse_scan_keywords() {
        assert_eq!(
            Command::parse("端口测试 example.com"),
            Ok(Command::Scan {
                keyword: ScanKeyword::PortTest,
                host: "example.com".to_string(),
                start: None,
                end: None,
            })
        );
        assert_eq!(
            Command::parse("端口扫描 example.com 20 25"),
            Ok(Command::Scan {
                keyword: ScanKeyword::PortScan,
                host: "example.com".to_string(),
                start: Port::new(20),
                end: Port::new(25),
            })
        );
        assert_eq!(Command::parse("端口扫描"), Err(Usage::PortScan));
        assert_eq!(Command::parse("端口测试 a.com x"), Err(Usage::PortTest));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse("天气 北京"),
            Ok(Command::Unknown("天气 北京".to_string()))
        );
        assert_eq!(Command::parse(""), Ok(Command::Unknown(String::new())));
    }

    #[tokio::test]
    async fn test_scan_command_with_bounds() {
        let (net, dispatcher) = dispatcher(&[22, 23]);

        let reply = dispatcher.handle("端口扫描 127.0.0.1 20 25").await;

        assert_eq!(reply, "开放的端口有：22, 23");
        let mut probed = net.probed.lock().unwrap().clone();
        probed.sort_unstable();
        assert_eq!(probed, vec![20, 21, 22, 23, 24, 25]);
    }

    #[tokio::test]
    async fn test_scan_command_defaults_to_1_through_1024() {
        let (net, dispatcher) = dispatcher(&[]);

        let reply = dispatcher.handle("端口测试 127.0.0.1").await;

        assert_eq!(reply, "没有发现开放的端口。");
        let probed = net.probed.lock().unwrap();
        assert_eq!(probed.len(), 1024);
        assert_eq!(probed.iter().min(), Some(&1));
        assert_eq!(probed.iter().max(), Some(&1024));
    }

    #[tokio::test]
    async fn test_reversed_scan_range_is_empty() {
        let (net, dispatcher) = dispatcher(&[60, 80]);

        let reply = dispatcher.handle("端口扫描 127.0.0.1 100 50").await;

        assert_eq!(reply, "没有发现开放的端口。");
        assert!(net.probed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tcping_and_ping_commands() {
        let (_net, dispatcher) = dispatcher(&[80]);

        let reply = dispatcher.handle("<@!1> /tcping 127.0.0.1").await;
        assert_eq!(reply, "TCP连接成功，响应时间：2.00 ms");

        let reply = dispatcher.handle("ping 127.0.0.1").await;
        assert_eq!(reply, "无法访问。");
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_commands() {
        let (_net, dispatcher) = dispatcher(&[]);

        assert_eq!(
            dispatcher.handle("tcping").await,
            "格式不正确，请使用：tcping <域名> [<端口>]"
        );
        assert_eq!(
            dispatcher.handle("端口扫描 127.0.0.1 1 99999").await,
            "格式不正确，请使用：端口扫描 <域名> <起始端口> <结束端口>"
        );
        assert_eq!(dispatcher.handle("你好吗").await, "我不太明白你说的是什么...");
    }

    #[tokio::test]
    async fn test_unresolvable_scan_host_reports_no_open_ports() {
        let (net, dispatcher) = dispatcher(&[1, 2, 3]);

        let reply = dispatcher.handle("端口扫描 nonexistent.invalid 1 5").await;

        assert_eq!(reply, "没有发现开放的端口。");
        assert!(net.probed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ping_with_garbage_host_gets_generic_error() {
        let (_net, dispatcher) = dispatcher(&[]);

        assert_eq!(
            dispatcher.handle("ping a.com b.com").await,
            "进行 ping 测试时发生错误，请检查域名是否正确。"
        );
        assert_eq!(dispatcher.handle("ping").await, reply::PING_USAGE);
    }

    #[tokio::test]
    async fn test_zero_concurrency_setting_is_rejected_per_request() {
        let net = Arc::new(FakeNet::default());
        let settings = ProbeSettings {
            scan_concurrency: 0,
            ..ProbeSettings::default()
        };
        let dispatcher = Dispatcher::new(Arc::clone(&net), Arc::new(SilentEcho), settings);

        let reply = dispatcher.handle("端口测试 127.0.0.1 1 5").await;

        assert_eq!(reply, reply::PORT_TEST_USAGE);
        assert!(net.probed.lock().unwrap().is_empty());
    }
}
