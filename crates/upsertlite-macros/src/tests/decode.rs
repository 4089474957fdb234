use crate::core::assert_errors_with;
use crate::decode::expand_derive_decode;
use syn::parse_str;

#[test]
fn derive_enum() {
    let input = parse_str("enum Foo { One, Two }").unwrap();
    let s = expand_derive_decode(&input).unwrap().to_string();
    assert!(s.contains("impl < 'r > upsertlite :: decode :: Decode < 'r > for Foo"));
    assert!(s.contains("\"one\" =>"));
}

#[test]
fn derive_enum_with_repr() {
    let input = parse_str("#[upsertlite(repr = \"i32\")] enum Foo { One, Two }").unwrap();
    let s = expand_derive_decode(&input).unwrap().to_string();
    assert!(s.contains("impl < 'r > upsertlite :: decode :: Decode < 'r > for Foo"));
    assert!(s.contains("as i32"));
}

#[test]
fn derive_struct() {
    let input = parse_str("struct Foo(i32);").unwrap();
    let s = expand_derive_decode(&input).unwrap().to_string();
    assert!(s.contains("impl < 'r > upsertlite :: decode :: Decode < 'r > for Foo"));
    assert!(s.contains("map (Self)"));
}

#[test]
fn derive_generic_struct() {
    let input = parse_str("struct Foo<T>(T);").unwrap();
    let s = expand_derive_decode(&input).unwrap().to_string();
    assert!(s.contains("impl < 'r , T > upsertlite :: decode :: Decode < 'r > for Foo < T >"));
}

#[test]
fn error_on_named_struct() {
    let input = parse_str("struct Foo { a: i32 }").unwrap();
    let e = expand_derive_decode(&input);
    assert_errors_with!(e, "structs must have exactly one unnamed field");
}

#[test]
fn error_on_empty_enum() {
    let input = parse_str("enum Foo {}").unwrap();
    let e = expand_derive_decode(&input);
    assert_errors_with!(e, "no variants");
}
