use chain_hash::BuildBase17Hasher;
use chain_hash::DefaultHashBuilder;
use chain_hash::HashMap;
use clap::Parser;
use clap::ValueEnum;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    /// The crate's default randomly keyed hasher
    Default,
    /// The deterministic base-17 polynomial hasher
    Base17,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "initial_capacity", default_value_t = 4)]
    initial_capacity: usize,

    #[arg(short = 'n', long = "entries", default_value_t = 1000)]
    entries: usize,

    #[arg(short = 's', long = "strategy", value_enum, default_value_t = Strategy::Default)]
    strategy: Strategy,
}

fn fill<S: core::hash::BuildHasher>(mut map: HashMap<String, usize, S>, entries: usize) {
    println!("Initial capacity: {}", map.capacity());

    let mut capacity = map.capacity();
    for i in 0..entries {
        map.insert(format!("key_{i}"), i);
        if map.capacity() != capacity {
            println!(
                "  grew {} -> {} buckets at {} entries",
                capacity,
                map.capacity(),
                map.len()
            );
            capacity = map.capacity();
        }
    }

    let missing = (0..entries)
        .filter(|i| map.get(&format!("key_{i}")) != Some(i))
        .count();

    println!("Inserted {} entries", map.len());
    println!("Final load factor: {:.2}%", map.load_factor() * 100.0);
    println!("Lookups failed: {}", missing);

    map.raw_table().print_chain_histogram();
    map.debug_stats().print();
}

fn main() {
    let args = Args::parse();

    println!(
        "Filling a map of {} entries using the {:?} strategy",
        args.entries, args.strategy
    );

    match args.strategy {
        Strategy::Default => fill(
            HashMap::with_capacity_and_hasher(args.initial_capacity, DefaultHashBuilder::default()),
            args.entries,
        ),
        Strategy::Base17 => fill(
            HashMap::with_capacity_and_hasher(args.initial_capacity, BuildBase17Hasher),
            args.entries,
        ),
    }
}
