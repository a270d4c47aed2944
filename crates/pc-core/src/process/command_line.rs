use crate::Node;

use pc_config::HostConfig;

use std::path::Path;

/// Argument vector used to launch `node`.
///
/// The program and its configured args come first, then the controller
/// wiring, then host-wide extra args, then the node's own extra args.
pub fn build_command_line(node: &Node, host: &HostConfig, certificate: &Path) -> Vec<String> {
    let mut argv = Vec::with_capacity(6 + node.args.len() + node.extra_args.len());
    argv.push(node.program.clone());
    argv.extend(node.args.iter().cloned());
    argv.push(format!("--home={}", node.home.display()));
    argv.push(format!("--controller-cert={}", certificate.display()));
    argv.push(format!("--controller-address={}", host.controller_address));
    argv.push(format!("--controller-port={}", host.controller_port));
    argv.extend(node.combined_extra_args(host).cloned());
    argv
}
