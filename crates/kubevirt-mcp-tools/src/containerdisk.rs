//! Resolution of OS shorthand names to containerdisk images.

/// Known OS names and the containerdisk images they map to. Cirros only
/// ships as a kubevirt demo image, everything else lives under
/// `quay.io/containerdisks`.
const OS_IMAGES: &[(&str, &str)] = &[
    ("fedora", "quay.io/containerdisks/fedora:latest"),
    ("ubuntu", "quay.io/containerdisks/ubuntu:latest"),
    ("centos", "quay.io/containerdisks/centos:latest"),
    ("debian", "quay.io/containerdisks/debian:latest"),
    ("rhel", "quay.io/containerdisks/rhel:latest"),
    ("opensuse", "quay.io/containerdisks/opensuse:latest"),
    ("alpine", "quay.io/containerdisks/alpine:latest"),
    ("cirros", "quay.io/kubevirt/cirros-container-disk-demo"),
    ("windows", "quay.io/containerdisks/windows:latest"),
    ("freebsd", "quay.io/containerdisks/freebsd:latest"),
];

/// Resolve an OS name like `fedora` to a containerdisk image reference.
///
/// Inputs that already look like an image reference pass through untouched;
/// unknown names fall back to `quay.io/containerdisks/{name}:latest`.
pub fn resolve(input: &str) -> String {
    if input.contains('/') || input.contains(':') {
        return input.to_string();
    }

    let normalized = input.trim().to_lowercase();
    for (os, image) in OS_IMAGES {
        if *os == normalized {
            return (*image).to_string();
        }
    }

    format!("quay.io/containerdisks/{normalized}:latest")
}
