//! Locate an upstream pool and append a backend server to it.

use upconf::{dump_block, parse, Style, UpstreamServer};

fn main() {
    let mut config = parse(
        "http{\n\tupstream my_backend{\n\t\tserver 127.0.0.1:443;\n\t\tserver 127.0.0.2:443 backup;\n\t}\n}",
    )
    .expect("valid configuration");

    let mut upstreams = config.find_upstreams_mut();
    upstreams[0].add_server(
        UpstreamServer::new("127.0.0.1:443")
            .parameter("weight", "5")
            .flag("down"),
    );

    println!("{}", dump_block(&config.block, &Style::indented()));
}
