use graphwalk_core::{traverse, FilterClause, Graph, NodeId, Pattern, Properties, Result, Value};
use std::time::Instant;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let node_count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(200_000);

    if mode == "help" || mode == "--help" {
        println!("Usage: graphwalk-bench [mode] [node_count]");
        println!();
        println!("Modes:");
        println!("  all     Run all generators and benchmark each (default)");
        println!("  org     People, companies and cities (WORKS_AT, KNOWS, LOCATED_IN)");
        println!("  chain   Typed chain where every step links to the next two");
        println!();
        println!("Default node_count: 200000");
        return Ok(());
    }

    println!("graphwalk-bench");
    println!("===============");
    println!();

    let suites: Vec<(&str, fn(u64) -> Result<Graph>, &[Query])> = match mode {
        "org" => vec![("Organisation", gen_org, ORG_QUERIES)],
        "chain" => vec![("Typed chain", gen_chain, CHAIN_QUERIES)],
        "all" => vec![
            ("Organisation", gen_org as fn(u64) -> Result<Graph>, ORG_QUERIES),
            ("Typed chain", gen_chain, CHAIN_QUERIES),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return Ok(());
        }
    };

    for (name, generator, queries) in suites {
        run_benchmark(name, generator, queries, node_count)?;
    }
    Ok(())
}

struct Query {
    start_type: &'static str,
    pattern: &'static str,
    filter: &'static str,
}

const ORG_QUERIES: &[Query] = &[
    Query {
        start_type: "Person",
        pattern: "-[WORKS_AT]-> Company",
        filter: "",
    },
    Query {
        start_type: "Person",
        pattern: "-[WORKS_AT]-> Company <-[WORKS_AT]- Person",
        filter: "",
    },
    Query {
        start_type: "Person",
        pattern: "-[WORKS_AT]-> Company <-[WORKS_AT]- Person",
        filter: "Person.age < 35",
    },
    Query {
        start_type: "Person",
        pattern: "-[KNOWS]-> Person -[WORKS_AT]-> Company -[LOCATED_IN]-> City",
        filter: "",
    },
    Query {
        start_type: "Person",
        pattern: "-[KNOWS]-> Person -[WORKS_AT]-> Company -[LOCATED_IN]-> City",
        filter: "Company.founded > 2000 AND Person.age >= 30",
    },
];

const CHAIN_QUERIES: &[Query] = &[
    Query {
        start_type: "Step",
        pattern: "-[NEXT]-> Step",
        filter: "",
    },
    Query {
        start_type: "Step",
        pattern: "-[NEXT]-> Step -[NEXT]-> Step",
        filter: "",
    },
    Query {
        start_type: "Step",
        pattern: "-[NEXT]-> Step -[NEXT]-> Step -[NEXT]-> Step",
        filter: "",
    },
    Query {
        start_type: "Step",
        pattern: "-[NEXT]-> Step -[NEXT]-> Step -[NEXT]-> Step",
        filter: "Step.parity == 0",
    },
];

/// Start nodes sampled per query.
const STARTS: usize = 1_000;

fn run_benchmark(
    name: &str,
    generator: fn(u64) -> Result<Graph>,
    queries: &[Query],
    node_count: u64,
) -> Result<()> {
    println!("--- {} ---", name);
    println!("Target: {} nodes", node_count);

    let t = Instant::now();
    let graph = generator(node_count)?;
    let gen_time = t.elapsed();
    println!(
        "Generated in {:.2}s, {} nodes, {} relationships, ~{:.0}MB",
        gen_time.as_secs_f64(),
        graph.node_count(),
        graph.relationship_count(),
        graph.memory_usage() as f64 / 1_048_576.0
    );

    println!();
    println!(
        "{:>5} {:>8} {:>12} {:>12} {:>10}  {}",
        "hops", "starts", "paths", "branches", "time", "query"
    );
    println!("{:->5} {:->8} {:->12} {:->12} {:->10}  {:-<5}", "", "", "", "", "", "");

    let mut rng = FastRng::new(7);
    for query in queries {
        let pattern = Pattern::parse(query.pattern)?;
        let filter = FilterClause::parse(query.filter);
        let candidates = graph.nodes_of_type(query.start_type);
        if candidates.is_empty() {
            continue;
        }

        let mut paths = 0;
        let mut branches = 0;
        let t = Instant::now();
        for _ in 0..STARTS {
            let start = &candidates[rng.next(candidates.len() as u64) as usize];
            let result = traverse(&graph, start, &pattern, &filter, None)?;
            paths += result.paths.len();
            branches += result.branches_visited;
        }
        let elapsed = t.elapsed();

        let label = if query.filter.is_empty() {
            query.pattern.to_string()
        } else {
            format!("{} WHERE {}", query.pattern, query.filter)
        };
        println!(
            "{:>5} {:>8} {:>12} {:>12} {:>8.1}ms  {}",
            pattern.len(),
            STARTS,
            paths,
            branches,
            elapsed.as_secs_f64() * 1000.0,
            label
        );
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Generators: O(n + relationships), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + self.next((hi - lo) as u64) as i64
    }
}

const ROLES: [&str; 4] = ["Engineer", "Designer", "Manager", "Analyst"];

fn props<const N: usize>(id: NodeId, extra: [(&str, Value); N]) -> Properties {
    let mut props = Properties::with_capacity(N + 1);
    props.insert("id".into(), Value::Int(id as i64));
    for (key, value) in extra {
        props.insert(key.into(), value);
    }
    props
}

/// Organisation graph: 80% people, 15% companies, 5% cities.
///
/// Every person works at one company and knows three other people; every
/// company is located in one city. Around five coworkers per company.
fn gen_org(node_count: u64) -> Result<Graph> {
    let people = (node_count * 80 / 100).max(1);
    let companies = (node_count * 15 / 100).max(1);
    let cities = node_count.saturating_sub(people + companies).max(1);
    let relationships = (people * 4 + companies) as usize;

    let mut graph = Graph::with_capacity((people + companies + cities) as usize, relationships);
    let mut rng = FastRng::new(42);

    let company_base = people;
    let city_base = people + companies;

    for id in 0..people {
        let age = rng.range(20, 65);
        graph.create_node("Person", props(id, [("name", format!("p_{}", id).into()), ("age", age.into())]))?;
    }
    for i in 0..companies {
        let id = company_base + i;
        let founded = rng.range(1950, 2024);
        graph.create_node(
            "Company",
            props(id, [("name", format!("c_{}", i).into()), ("founded", founded.into())]),
        )?;
    }
    for i in 0..cities {
        graph.create_node("City", props(city_base + i, [("name", format!("city_{}", i).into())]))?;
    }

    for i in 0..companies {
        let city = city_base + rng.next(cities);
        graph.create_relationship("LOCATED_IN", "Company", company_base + i, "City", city, Properties::new())?;
    }
    for person in 0..people {
        let company = company_base + rng.next(companies);
        let mut rel_props = Properties::new();
        rel_props.insert("since".into(), Value::Int(rng.range(1990, 2025)));
        rel_props.insert("role".into(), ROLES[rng.next(ROLES.len() as u64) as usize].into());
        graph.create_relationship("WORKS_AT", "Person", person, "Company", company, rel_props)?;

        for _ in 0..3 {
            let other = rng.next(people);
            if other != person {
                graph.create_relationship("KNOWS", "Person", person, "Person", other, Properties::new())?;
            }
        }
    }

    Ok(graph)
}

/// Chain of `Step` nodes where step i links to i+1 and i+2, so a k-hop
/// pattern fans out to about 2^k paths.
fn gen_chain(node_count: u64) -> Result<Graph> {
    let mut graph = Graph::with_capacity(node_count as usize, (node_count * 2) as usize);

    for id in 0..node_count {
        graph.create_node("Step", props(id, [("parity", Value::Int((id % 2) as i64))]))?;
    }
    for id in 0..node_count {
        for next in [id + 1, id + 2] {
            if next < node_count {
                graph.create_relationship("NEXT", "Step", id, "Step", next, Properties::new())?;
            }
        }
    }

    Ok(graph)
}
