//! Chain-loader behaviour across providers

use assert_fs::TempDir;
use assert_fs::prelude::*;
use buildcfg_fs::NormalizedPath;
use buildcfg_toolchain::{
    ChainLoader, Error, Host, ToolchainContext, ToolchainField, TripletRegistry,
};
use pretty_assertions::assert_eq;

fn fake_compiler(dir: &TempDir, name: &str) {
    let file = dir.child("bin").child(name);
    file.write_str("#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

fn context(dir: &TempDir) -> ToolchainContext {
    let mut context = ToolchainContext::new(Host::new("Linux", "x86_64"));
    context.search_dirs = vec![NormalizedPath::new(dir.child("bin").path())];
    context
}

#[test]
fn explicit_compiler_survives_every_later_provider() {
    let temp = TempDir::new().unwrap();
    for name in ["clang", "clang++", "gcc", "g++"] {
        fake_compiler(&temp, name);
    }
    temp.child("toolchains/clang.cmake")
        .write_str("set(CMAKE_C_COMPILER clang)\nset(CMAKE_CXX_COMPILER clang++)\n")
        .unwrap();

    let mut context = context(&temp);
    context
        .cache_variables
        .insert("CMAKE_C_COMPILER".into(), "/opt/vendor/bin/vcc".into());
    context.chainload_toolchain_file = Some(NormalizedPath::new(
        temp.child("toolchains/clang.cmake").path(),
    ));

    let loaded = ChainLoader::standard().load(&context).unwrap();

    assert_eq!(loaded.state.c_compiler(), Some("/opt/vendor/bin/vcc"));
    assert_eq!(
        loaded.state.provided(ToolchainField::CCompiler).unwrap().origin,
        "explicit"
    );
    let cxx = loaded.state.provided(ToolchainField::CxxCompiler).unwrap();
    assert!(cxx.value.ends_with("bin/clang++"));
    assert_eq!(cxx.origin, "chainload");
}

#[test]
fn discovery_fills_compilers_when_nothing_else_does() {
    let temp = TempDir::new().unwrap();
    fake_compiler(&temp, "gcc");
    fake_compiler(&temp, "g++");

    let loaded = ChainLoader::standard().load(&context(&temp)).unwrap();

    let discovery = loaded
        .reports
        .iter()
        .find(|r| r.provider == "discovery")
        .unwrap();
    assert_eq!(
        discovery.filled,
        vec![ToolchainField::CCompiler, ToolchainField::CxxCompiler]
    );
    assert!(loaded.state.c_compiler().unwrap().ends_with("bin/gcc"));
}

#[test]
fn no_compiler_anywhere_is_fatal() {
    let temp = TempDir::new().unwrap();
    temp.child("bin").create_dir_all().unwrap();

    let err = ChainLoader::standard().load(&context(&temp)).unwrap_err();

    match err {
        Error::MissingCompiler { tool, searched } => {
            assert_eq!(tool, "C compiler");
            assert_eq!(searched.len(), 1);
        }
        other => panic!("expected missing compiler, got {other:?}"),
    }
}

#[test]
fn chainloaded_compiler_that_exists_nowhere_is_fatal() {
    let temp = TempDir::new().unwrap();
    temp.child("bin").create_dir_all().unwrap();
    temp.child("toolchains/clang.cmake")
        .write_str(
            "set(CMAKE_C_COMPILER clang-does-not-exist)\n\
             set(CMAKE_CXX_COMPILER clang++-does-not-exist)\n",
        )
        .unwrap();

    let mut context = context(&temp);
    context.chainload_toolchain_file = Some(NormalizedPath::new(
        temp.child("toolchains/clang.cmake").path(),
    ));

    let err = ChainLoader::standard().load(&context).unwrap_err();

    match err {
        Error::MissingCompiler { tool, searched } => {
            assert_eq!(tool, "C compiler 'clang-does-not-exist'");
            assert_eq!(searched.len(), 1);
        }
        other => panic!("expected missing compiler, got {other:?}"),
    }
}

#[test]
fn bare_compiler_names_resolve_through_path() {
    let temp = TempDir::new().unwrap();
    temp.child("bin").create_dir_all().unwrap();
    let path_dir = TempDir::new().unwrap();
    fake_compiler(&path_dir, "cc");
    fake_compiler(&path_dir, "c++");

    let mut context = context(&temp);
    context
        .cache_variables
        .insert("CMAKE_C_COMPILER".into(), "cc".into());
    context
        .cache_variables
        .insert("CMAKE_CXX_COMPILER".into(), "c++".into());
    context.environment.insert(
        "PATH".into(),
        path_dir.child("bin").path().to_string_lossy().into_owned(),
    );

    let loaded = ChainLoader::standard().load(&context).unwrap();

    let c = loaded.state.provided(ToolchainField::CCompiler).unwrap();
    assert_eq!(
        c.value,
        NormalizedPath::new(path_dir.child("bin/cc").path()).to_string()
    );
    assert_eq!(c.origin, "explicit");
    assert!(loaded.state.cxx_compiler().unwrap().ends_with("bin/c++"));
}

#[test]
fn compiler_given_as_path_is_kept_as_is() {
    let temp = TempDir::new().unwrap();
    temp.child("bin").create_dir_all().unwrap();

    let mut context = context(&temp);
    context
        .cache_variables
        .insert("CMAKE_C_COMPILER".into(), "/opt/vendor/bin/vcc".into());
    context
        .cache_variables
        .insert("CMAKE_CXX_COMPILER".into(), "/opt/vendor/bin/vc++".into());

    let loaded = ChainLoader::standard().load(&context).unwrap();

    assert_eq!(loaded.state.c_compiler(), Some("/opt/vendor/bin/vcc"));
    assert_eq!(loaded.state.cxx_compiler(), Some("/opt/vendor/bin/vc++"));
}

#[test]
fn overlay_triplet_drives_chainload_and_target() {
    let temp = TempDir::new().unwrap();
    fake_compiler(&temp, "aarch64-linux-gnu-gcc");
    fake_compiler(&temp, "aarch64-linux-gnu-g++");
    temp.child("triplets/arm64-linux-gnu.cmake")
        .write_str(
            "set(VCPKG_TARGET_ARCHITECTURE arm64)\n\
             set(VCPKG_CMAKE_SYSTEM_NAME Linux)\n\
             set(VCPKG_CHAINLOAD_TOOLCHAIN_FILE ../toolchains/cross.cmake)\n",
        )
        .unwrap();
    temp.child("toolchains/cross.cmake")
        .write_str("set(CMAKE_SYSROOT /sysroots/aarch64)\n")
        .unwrap();

    let registry = TripletRegistry::new(vec![NormalizedPath::new(
        temp.child("triplets").path(),
    )]);
    let mut context = context(&temp);
    context.triplet = Some(registry.lookup("arm64-linux-gnu").unwrap());

    let loaded = ChainLoader::standard().load(&context).unwrap();

    assert_eq!(loaded.state.sysroot(), Some("/sysroots/aarch64"));
    assert_eq!(
        loaded.state.get(ToolchainField::FindRootPath),
        Some("/sysroots/aarch64")
    );
    assert_eq!(loaded.state.system_processor(), Some("aarch64"));
    assert_eq!(loaded.state.triplet(), Some("arm64-linux-gnu"));
    assert!(
        loaded
            .state
            .c_compiler()
            .unwrap()
            .ends_with("aarch64-linux-gnu-gcc")
    );
}
