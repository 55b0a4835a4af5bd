//! Parsing of `kubevirt://` resource URIs.
//!
//! The grammar is `kubevirt://{scope}/{collection}[/{name}[/{subresource}]]`
//! where `scope` is a namespace for namespaced collections and the literal
//! `cluster` for cluster-scoped ones.

use crate::error::{KubeVirtError, Result};

/// A fully parsed resource URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceAddress {
    VmList { namespace: String },
    Vm { namespace: String, name: String },
    VmStatus { namespace: String, name: String },
    VmConsole { namespace: String, name: String },
    VmiList { namespace: String },
    Vmi { namespace: String, name: String },
    VmiGuestOsInfo { namespace: String, name: String },
    VmiFilesystems { namespace: String, name: String },
    VmiUserList { namespace: String, name: String },
    DataVolumeList { namespace: String },
    DataVolume { namespace: String, name: String },
    InstancetypeList { namespace: String },
    PreferenceList { namespace: String },
    ClusterInstancetypeList,
    ClusterPreferenceList,
    ClusterInstancetype { name: String },
    ClusterPreference { name: String },
}

impl ResourceAddress {
    /// Parse a `kubevirt://` URI, validating each segment before it is used.
    pub fn parse(uri: &str) -> Result<Self> {
        let parts: Vec<&str> = uri.split('/').collect();
        if parts.len() < 4 || parts[0] != "kubevirt:" || !parts[1].is_empty() {
            return Err(KubeVirtError::InvalidUri(
                "kubevirt://{namespace}/{collection}[/{name}[/{subresource}]]".to_string(),
            ));
        }

        let scope = parts[2];
        let collection = parts[3];
        if scope.is_empty() {
            return Err(KubeVirtError::EmptySegment("namespace"));
        }

        match collection {
            "vms" => {
                expect_len(&parts, 4, "kubevirt://{namespace}/vms")?;
                Ok(ResourceAddress::VmList {
                    namespace: scope.to_string(),
                })
            }
            "vm" => {
                let name = named(&parts, "kubevirt://{namespace}/vm/{name}[/{subresource}]")?;
                if parts.len() > 6 {
                    return Err(KubeVirtError::InvalidUri(
                        "kubevirt://{namespace}/vm/{name}[/{subresource}]".to_string(),
                    ));
                }
                match parts.get(5).copied() {
                    None => Ok(ResourceAddress::Vm {
                        namespace: scope.to_string(),
                        name,
                    }),
                    Some("status") => Ok(ResourceAddress::VmStatus {
                        namespace: scope.to_string(),
                        name,
                    }),
                    Some("console") => Ok(ResourceAddress::VmConsole {
                        namespace: scope.to_string(),
                        name,
                    }),
                    Some(_) => Err(KubeVirtError::InvalidUri(
                        "kubevirt://{namespace}/vm/{name}/{status|console}".to_string(),
                    )),
                }
            }
            "vmis" => {
                expect_len(&parts, 4, "kubevirt://{namespace}/vmis")?;
                Ok(ResourceAddress::VmiList {
                    namespace: scope.to_string(),
                })
            }
            "vmi" => {
                let name = named(&parts, "kubevirt://{namespace}/vmi/{name}[/{subresource}]")?;
                if parts.len() > 6 {
                    return Err(KubeVirtError::InvalidUri(
                        "kubevirt://{namespace}/vmi/{name}[/{subresource}]".to_string(),
                    ));
                }
                match parts.get(5).copied() {
                    None => Ok(ResourceAddress::Vmi {
                        namespace: scope.to_string(),
                        name,
                    }),
                    Some("guestosinfo") => Ok(ResourceAddress::VmiGuestOsInfo {
                        namespace: scope.to_string(),
                        name,
                    }),
                    Some("filesystems") => Ok(ResourceAddress::VmiFilesystems {
                        namespace: scope.to_string(),
                        name,
                    }),
                    Some("userlist") => Ok(ResourceAddress::VmiUserList {
                        namespace: scope.to_string(),
                        name,
                    }),
                    Some(_) => Err(KubeVirtError::InvalidUri(
                        "kubevirt://{namespace}/vmi/{name}/{guestosinfo|filesystems|userlist}"
                            .to_string(),
                    )),
                }
            }
            "datavolumes" => {
                expect_len(&parts, 4, "kubevirt://{namespace}/datavolumes")?;
                Ok(ResourceAddress::DataVolumeList {
                    namespace: scope.to_string(),
                })
            }
            "datavolume" => {
                let name = named(&parts, "kubevirt://{namespace}/datavolume/{name}")?;
                expect_len(&parts, 5, "kubevirt://{namespace}/datavolume/{name}")?;
                Ok(ResourceAddress::DataVolume {
                    namespace: scope.to_string(),
                    name,
                })
            }
            "instancetypes" => {
                expect_len(&parts, 4, "kubevirt://{scope}/instancetypes")?;
                if scope == "cluster" {
                    Ok(ResourceAddress::ClusterInstancetypeList)
                } else {
                    Ok(ResourceAddress::InstancetypeList {
                        namespace: scope.to_string(),
                    })
                }
            }
            "preferences" => {
                expect_len(&parts, 4, "kubevirt://{scope}/preferences")?;
                if scope == "cluster" {
                    Ok(ResourceAddress::ClusterPreferenceList)
                } else {
                    Ok(ResourceAddress::PreferenceList {
                        namespace: scope.to_string(),
                    })
                }
            }
            "cluster-instancetype" => {
                require_cluster_scope(scope, "kubevirt://cluster/cluster-instancetype/{name}")?;
                let name = named(&parts, "kubevirt://cluster/cluster-instancetype/{name}")?;
                expect_len(&parts, 5, "kubevirt://cluster/cluster-instancetype/{name}")?;
                Ok(ResourceAddress::ClusterInstancetype { name })
            }
            "cluster-preference" => {
                require_cluster_scope(scope, "kubevirt://cluster/cluster-preference/{name}")?;
                let name = named(&parts, "kubevirt://cluster/cluster-preference/{name}")?;
                expect_len(&parts, 5, "kubevirt://cluster/cluster-preference/{name}")?;
                Ok(ResourceAddress::ClusterPreference { name })
            }
            _ => Err(KubeVirtError::InvalidUri(
                "kubevirt://{scope}/{vms|vm|vmis|vmi|datavolumes|datavolume|instancetypes|preferences|cluster-instancetype|cluster-preference}"
                    .to_string(),
            )),
        }
    }
}

fn expect_len(parts: &[&str], len: usize, expected: &str) -> Result<()> {
    if parts.len() != len {
        return Err(KubeVirtError::InvalidUri(expected.to_string()));
    }
    Ok(())
}

fn named(parts: &[&str], expected: &str) -> Result<String> {
    match parts.get(4).copied() {
        None => Err(KubeVirtError::InvalidUri(expected.to_string())),
        Some("") => Err(KubeVirtError::EmptySegment("name")),
        Some(name) => Ok(name.to_string()),
    }
}

fn require_cluster_scope(scope: &str, expected: &str) -> Result<()> {
    if scope != "cluster" {
        return Err(KubeVirtError::InvalidUri(expected.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str) -> Result<ResourceAddress> {
        ResourceAddress::parse(uri)
    }

    #[test]
    fn parses_collection_uris() {
        assert_eq!(
            parse("kubevirt://default/vms").unwrap(),
            ResourceAddress::VmList {
                namespace: "default".into()
            }
        );
        assert_eq!(
            parse("kubevirt://ns1/vmis").unwrap(),
            ResourceAddress::VmiList {
                namespace: "ns1".into()
            }
        );
        assert_eq!(
            parse("kubevirt://ns1/datavolumes").unwrap(),
            ResourceAddress::DataVolumeList {
                namespace: "ns1".into()
            }
        );
    }

    #[test]
    fn parses_named_uris_and_subresources() {
        assert_eq!(
            parse("kubevirt://default/vm/testvm").unwrap(),
            ResourceAddress::Vm {
                namespace: "default".into(),
                name: "testvm".into()
            }
        );
        assert_eq!(
            parse("kubevirt://default/vm/testvm/status").unwrap(),
            ResourceAddress::VmStatus {
                namespace: "default".into(),
                name: "testvm".into()
            }
        );
        assert_eq!(
            parse("kubevirt://default/vm/testvm/console").unwrap(),
            ResourceAddress::VmConsole {
                namespace: "default".into(),
                name: "testvm".into()
            }
        );
        assert_eq!(
            parse("kubevirt://default/vmi/testvm/guestosinfo").unwrap(),
            ResourceAddress::VmiGuestOsInfo {
                namespace: "default".into(),
                name: "testvm".into()
            }
        );
        assert_eq!(
            parse("kubevirt://default/vmi/testvm/filesystems").unwrap(),
            ResourceAddress::VmiFilesystems {
                namespace: "default".into(),
                name: "testvm".into()
            }
        );
        assert_eq!(
            parse("kubevirt://default/vmi/testvm/userlist").unwrap(),
            ResourceAddress::VmiUserList {
                namespace: "default".into(),
                name: "testvm".into()
            }
        );
    }

    #[test]
    fn parses_instancetype_and_preference_uris() {
        assert_eq!(
            parse("kubevirt://ns1/instancetypes").unwrap(),
            ResourceAddress::InstancetypeList {
                namespace: "ns1".into()
            }
        );
        assert_eq!(
            parse("kubevirt://cluster/instancetypes").unwrap(),
            ResourceAddress::ClusterInstancetypeList
        );
        assert_eq!(
            parse("kubevirt://cluster/preferences").unwrap(),
            ResourceAddress::ClusterPreferenceList
        );
        assert_eq!(
            parse("kubevirt://cluster/cluster-instancetype/u1.medium").unwrap(),
            ResourceAddress::ClusterInstancetype {
                name: "u1.medium".into()
            }
        );
        assert_eq!(
            parse("kubevirt://cluster/cluster-preference/fedora").unwrap(),
            ResourceAddress::ClusterPreference {
                name: "fedora".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_uris() {
        for uri in [
            "",
            "kubevirt://",
            "kubevirt://default",
            "http://default/vms",
            "kubevirt:/default/vms",
            "kubevirt://default/unknown",
            "kubevirt://default/vm/testvm/unknown",
            "kubevirt://default/vms/extra",
        ] {
            let err = parse(uri).unwrap_err();
            assert!(
                err.to_string().starts_with("invalid URI format"),
                "{uri}: {err}"
            );
        }
    }

    #[test]
    fn rejects_empty_namespace() {
        let err = parse("kubevirt:///vms").unwrap_err();
        assert_eq!(err.to_string(), "resource namespace may not be empty");
    }

    #[test]
    fn rejects_empty_name_before_subresource() {
        let err = parse("kubevirt://test-ns/vm//status").unwrap_err();
        assert_eq!(err.to_string(), "resource name may not be empty");
        let err = parse("kubevirt://test-ns/datavolume/").unwrap_err();
        assert_eq!(err.to_string(), "resource name may not be empty");
    }

    #[test]
    fn cluster_collections_require_cluster_scope() {
        let err = parse("kubevirt://ns1/cluster-instancetype/u1.medium").unwrap_err();
        assert!(err.to_string().starts_with("invalid URI format"));
        let err = parse("kubevirt://ns1/cluster-preference/fedora").unwrap_err();
        assert!(err.to_string().starts_with("invalid URI format"));
    }
}
