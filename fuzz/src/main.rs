use jsonduct::feeder::SliceJsonFeeder;
use jsonduct::NullHandler;
use jsonduct::JsonParser;

#[macro_use]
extern crate afl;

fn main() {
    fuzz!(|data: &[u8]| {
        let feeder = SliceJsonFeeder::new(data);
        let mut parser = JsonParser::new(feeder, NullHandler);
        let _ = parser.parse();
    });
}
