//! Manifests and ops files compiled into the binary.
//!
//! The director and jumpbox manifests follow the upstream bosh-deployment and
//! jumpbox-deployment layouts. Ops files are looked up by file name, which
//! is also the name they are written under in the working directory.

use bbl_state::Iaas;

pub const DIRECTOR_MANIFEST: &str = include_str!("../assets/director/bosh.yml");
pub const JUMPBOX_MANIFEST: &str = include_str!("../assets/jumpbox/jumpbox.yml");

const DIRECTOR_AWS_CPI: &str = include_str!("../assets/director/aws/cpi.yml");
const DIRECTOR_GCP_CPI: &str = include_str!("../assets/director/gcp/cpi.yml");
const DIRECTOR_AZURE_CPI: &str = include_str!("../assets/director/azure/cpi.yml");

const JUMPBOX_AWS_CPI: &str = include_str!("../assets/jumpbox/aws/cpi.yml");
const JUMPBOX_GCP_CPI: &str = include_str!("../assets/jumpbox/gcp/cpi.yml");
const JUMPBOX_AZURE_CPI: &str = include_str!("../assets/jumpbox/azure/cpi.yml");

const JUMPBOX_USER: &str = include_str!("../assets/director/jumpbox-user.yml");
const UAA: &str = include_str!("../assets/director/uaa.yml");
const CREDHUB: &str = include_str!("../assets/director/credhub.yml");
const IAM_INSTANCE_PROFILE: &str = include_str!("../assets/director/aws/iam-instance-profile.yml");
const EXTERNAL_IP_NOT_RECOMMENDED: &str =
    include_str!("../assets/director/external-ip-not-recommended.yml");

const GCP_EPHEMERAL_IP: &str = "---
- type: replace
  path: /networks/name=default/subnets/0/cloud_properties/ephemeral_external_ip?
  value: true
";

const AWS_EPHEMERAL_IP: &str = "---
- type: replace
  path: /resource_pools/name=vms/cloud_properties/auto_assign_public_ip?
  value: true
";

const AWS_ENCRYPT_DISK: &str = "---
- type: replace
  path: /disk_pools/name=disks/cloud_properties?
  value:
    type: gp2
    encrypted: true
    kms_key_arn: ((kms_key_arn))
";

const AZURE_SSH_STATIC_IP: &str = "---
- type: replace
  path: /cloud_provider/ssh_tunnel/host
  value: ((external_ip))
";

/// The director CPI ops file for `iaas`.
pub fn director_cpi(iaas: Iaas) -> &'static str {
    match iaas {
        Iaas::Aws => DIRECTOR_AWS_CPI,
        Iaas::Gcp => DIRECTOR_GCP_CPI,
        Iaas::Azure => DIRECTOR_AZURE_CPI,
    }
}

/// The jumpbox CPI ops file for `iaas`.
pub fn jumpbox_cpi(iaas: Iaas) -> &'static str {
    match iaas {
        Iaas::Aws => JUMPBOX_AWS_CPI,
        Iaas::Gcp => JUMPBOX_GCP_CPI,
        Iaas::Azure => JUMPBOX_AZURE_CPI,
    }
}

/// A director ops file by name, e.g. `uaa.yml`.
pub fn director_ops_file(name: &str) -> Option<&'static str> {
    let contents = match name {
        "jumpbox-user.yml" => JUMPBOX_USER,
        "uaa.yml" => UAA,
        "credhub.yml" => CREDHUB,
        "iam-instance-profile.yml" => IAM_INSTANCE_PROFILE,
        "gcp-bosh-director-ephemeral-ip-ops.yml" => GCP_EPHEMERAL_IP,
        "aws-bosh-director-ephemeral-ip-ops.yml" => AWS_EPHEMERAL_IP,
        "aws-bosh-director-encrypt-disk-ops.yml" => AWS_ENCRYPT_DISK,
        "azure-external-ip-not-recommended.yml" => EXTERNAL_IP_NOT_RECOMMENDED,
        "azure-ssh-static-ip.yml" => AZURE_SSH_STATIC_IP,
        _ => return None,
    };
    Some(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbl_iaas::provider_for;

    #[test]
    fn test_every_provider_fragment_exists() {
        for iaas in Iaas::all() {
            for name in provider_for(iaas).director_ops_files() {
                assert!(
                    director_ops_file(name).is_some(),
                    "{} fragment {} has no asset",
                    iaas,
                    name
                );
            }
        }
    }

    #[test]
    fn test_assets_are_yaml() {
        let mut all = vec![DIRECTOR_MANIFEST, JUMPBOX_MANIFEST];
        for iaas in Iaas::all() {
            all.push(director_cpi(iaas));
            all.push(jumpbox_cpi(iaas));
        }
        for contents in all {
            serde_yaml::from_str::<serde_yaml::Value>(contents).unwrap();
        }
    }

    #[test]
    fn test_unknown_ops_file() {
        assert!(director_ops_file("openstack-cpi.yml").is_none());
    }
}
