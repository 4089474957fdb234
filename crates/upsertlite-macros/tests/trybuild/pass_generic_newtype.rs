use upsertlite::{Codec, Record};

#[derive(Codec)]
struct Wrapper<T>(T);

#[derive(Codec)]
#[upsertlite(rename_all = "kebab_case")]
enum Color {
    DarkRed,
    Blue,
}

fn main() {
    let record = Record::new()
        .with("a", Wrapper(5i64))
        .with("b", Wrapper(String::from("x")))
        .with("c", Color::DarkRed)
        .with("d", Color::Blue);
    assert!(record.check().is_ok());
}
