// Copyright (c) 2025 - Cowboy AI, Inc.
//! Vagrantfile rendering
//!
//! The only place document text is produced. Blocks must be validated
//! before they get here; values are quoted as-is.

use std::fmt::Write;

use super::model::{BlockBody, LocalBlock, NetworkRef, RemoteBlock, VmBlock};

/// Written once at the top of every document
pub const HEADER: &str = r#"# -*- mode: ruby -*-
# vi: set ft=ruby :

required_plugins = %w(vagrant-openstack-provider)
required_plugins.each do |plugin|
  system "vagrant plugin install #{plugin}" unless Vagrant.has_plugin? plugin
end

Vagrant.configure("2") do |config|
"#;

/// Closes the `Vagrant.configure` body; always the last line
pub const TRAILER: &str = "end\n";

/// Opening line of a VM block, up to the quoted hostname
pub(crate) const BLOCK_OPEN: &str = "  config.vm.define \"";

/// Closing line of a VM block
pub(crate) const BLOCK_CLOSE: &str = "  end";

/// Provider line that marks a block as remote
pub(crate) const OPENSTACK_PROVIDER: &str = "    host.vm.provider :openstack do |os|";

/// Provider options read from the environment at `vagrant up` time
const OPENSTACK_AUTH: [(&str, &str); 5] = [
    ("openstack_auth_url", "OS_AUTH_URL"),
    ("username", "OS_USERNAME"),
    ("password", "OS_PASSWORD"),
    ("tenant_name", "OS_TENANT_NAME"),
    ("region", "OS_REGION_NAME"),
];

/// Text of an empty document
pub fn empty_document() -> String {
    format!("{}{}", HEADER, TRAILER)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value)
}

fn quote_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("[{}]", items.join(", "))
}

/// Render one block, preceded by a separating blank line
pub fn render_block(block: &VmBlock) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = render_into(&mut out, block);
    out
}

fn render_into(out: &mut String, block: &VmBlock) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}{}\" do |host|", BLOCK_OPEN, block.hostname)?;
    match &block.body {
        BlockBody::Local(local) => render_local(out, block, local)?,
        BlockBody::Remote(remote) => render_remote(out, block, remote)?,
    }
    writeln!(
        out,
        "    host.vm.provision :shell, path: {}, args: {}",
        quote(&block.provisioner.script),
        quote_list(&block.provisioner.args)
    )?;
    writeln!(out, "{}", BLOCK_CLOSE)
}

fn render_local(out: &mut String, block: &VmBlock, local: &LocalBlock) -> std::fmt::Result {
    writeln!(out, "    host.vm.box = {}", quote(&local.box_name))?;
    writeln!(out, "    host.vm.hostname = {}", quote(&block.fqdn))?;
    writeln!(
        out,
        "    host.vm.network :private_network, ip: {}, mac: {}",
        quote(&local.ip.to_string()),
        quote(&local.mac.compact())
    )?;
    writeln!(out, "    host.vm.provider :virtualbox do |vb|")?;
    writeln!(out, "      vb.memory = {}", local.memory)?;
    writeln!(out, "    end")?;
    writeln!(
        out,
        "    host.vm.synced_folder {}, {}",
        quote(&local.synced_folder.0),
        quote(&local.synced_folder.1)
    )
}

fn render_network(network: &NetworkRef) -> String {
    match network.address {
        Some(address) => format!(
            "{{ name: {}, address: {} }}",
            quote(&network.name),
            quote(&address.to_string())
        ),
        None => quote(&network.name),
    }
}

fn render_remote(out: &mut String, block: &VmBlock, remote: &RemoteBlock) -> std::fmt::Result {
    writeln!(out, "    host.vm.hostname = {}", quote(&block.fqdn))?;
    writeln!(out, "    host.vm.synced_folder \".\", \"/vagrant\", disabled: true")?;
    writeln!(out, "{}", OPENSTACK_PROVIDER)?;
    for (option, var) in OPENSTACK_AUTH {
        writeln!(out, "      os.{} = ENV['{}']", option, var)?;
    }
    writeln!(out, "      os.server_name = {}", quote(block.hostname.as_str()))?;
    writeln!(out, "      os.flavor = {}", quote(&remote.flavor))?;
    writeln!(out, "      os.image = {}", quote(&remote.image))?;
    writeln!(out, "      os.floating_ip_pool = {}", quote(&remote.floating_ip_pool))?;
    writeln!(out, "      os.networks = [")?;
    let last = remote.networks.len().saturating_sub(1);
    for (i, network) in remote.networks.iter().enumerate() {
        let comma = if i == last { "" } else { "," };
        writeln!(out, "        {}{}", render_network(network), comma)?;
    }
    writeln!(out, "      ]")?;
    writeln!(out, "      os.security_groups = {}", quote_list(&remote.security_groups))?;
    writeln!(out, "    end")
}
