use super::commands::build_cli;
use super::dispatch::{DirectParams, DumpParams, EraseParams, InvokerParams};

#[test]
fn dump_collects_edits_in_order() {
    let m = build_cli()
        .try_get_matches_from([
            "linkform", "dump", "(LL)L", "-e", "bind:1:L", "--edit", "permute:0", "--stats",
        ])
        .unwrap();
    let (name, sub) = m.subcommand().unwrap();
    assert_eq!(name, "dump");

    let params = DumpParams::from_matches(sub);
    assert_eq!(params.signature, "(LL)L");
    assert_eq!(params.edits, ["bind:1:L", "permute:0"]);
    assert!(params.stats);
    assert!(!params.last);
}

#[test]
fn dump_without_edits() {
    let m = build_cli()
        .try_get_matches_from(["linkform", "dump", "(Object)void"])
        .unwrap();
    let params = DumpParams::from_matches(m.subcommand_matches("dump").unwrap());
    assert!(params.edits.is_empty());
}

#[test]
fn invoker_flags() {
    let m = build_cli()
        .try_get_matches_from(["linkform", "invoker", "(LI)L", "--generic", "--linker"])
        .unwrap();
    let params = InvokerParams::from_matches(m.subcommand_matches("invoker").unwrap());
    assert_eq!(params.signature, "(LI)L");
    assert!(params.generic);
    assert!(params.linker);
}

#[test]
fn direct_requires_a_known_kind() {
    let m = build_cli()
        .try_get_matches_from(["linkform", "direct", "(I)I", "-k", "static", "--init"])
        .unwrap();
    let params = DirectParams::from_matches(m.subcommand_matches("direct").unwrap());
    assert_eq!(params.kind, "static");
    assert!(params.init);

    let missing = build_cli().try_get_matches_from(["linkform", "direct", "(I)I"]);
    assert!(missing.is_err());
    let unknown = build_cli().try_get_matches_from(["linkform", "direct", "(I)I", "-k", "super"]);
    assert!(unknown.is_err());
}

#[test]
fn erase_takes_a_signature() {
    let m = build_cli()
        .try_get_matches_from(["linkform", "erase", "(String)short"])
        .unwrap();
    let params = EraseParams::from_matches(m.subcommand_matches("erase").unwrap());
    assert_eq!(params.signature, "(String)short");

    assert!(build_cli().try_get_matches_from(["linkform", "erase"]).is_err());
}

#[test]
fn subcommand_is_required() {
    assert!(build_cli().try_get_matches_from(["linkform"]).is_err());
}
