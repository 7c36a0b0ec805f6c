//! Reply strings.
//!
//! Every message a user can receive from a probe request is built here, so
//! the wording stays in one place. Raw error text never appears in a reply;
//! it goes to the log instead.

use crate::scanner::{ProbeOutcome, ScanResult};

pub const PING_USAGE: &str = "格式不正确，请使用：ping <域名>";
pub const TCPING_USAGE: &str = "格式不正确，请使用：tcping <域名> [<端口>]";
pub const PORT_TEST_USAGE: &str = "格式不正确，请使用：端口测试 <域名> [<起始端口>] [<结束端口>]";
pub const PORT_SCAN_USAGE: &str = "格式不正确，请使用：端口扫描 <域名> <起始端口> <结束端口>";
pub const UNKNOWN_COMMAND: &str = "我不太明白你说的是什么...";

const PING_UNREACHABLE: &str = "无法访问。";
const PING_FAILED: &str = "进行 ping 测试时发生错误，请检查域名是否正确。";
const TCP_UNREACHABLE: &str = "无法连接到指定的端口。";
const TCP_FAILED: &str = "进行 TCP 测试时发生错误，请检查域名和端口。";
const SCAN_EMPTY: &str = "没有发现开放的端口。";

/// Reply for an ICMP-style reachability probe.
pub fn ping(outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Success { latency_ms } => format!("可以访问，响应时间：{latency_ms:.2} ms"),
        ProbeOutcome::Unreachable { .. } => PING_UNREACHABLE.to_string(),
        ProbeOutcome::Error { .. } => PING_FAILED.to_string(),
    }
}

/// Reply for a TCP latency probe.
pub fn tcp_ping(outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Success { latency_ms } => {
            format!("TCP连接成功，响应时间：{latency_ms:.2} ms")
        }
        ProbeOutcome::Unreachable { .. } => TCP_UNREACHABLE.to_string(),
        ProbeOutcome::Error { .. } => TCP_FAILED.to_string(),
    }
}

/// Reply for a completed port scan.
pub fn scan(result: &ScanResult) -> String {
    if result.is_empty() {
        return SCAN_EMPTY.to_string();
    }

    let ports: Vec<String> = result.open_ports().iter().map(|p| p.to_string()).collect();
    format!("开放的端口有：{}", ports.join(", "))
}
