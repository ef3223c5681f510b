//! Public-API tests on a realistic full configuration.

use upconf::{dump_config, parse, Style, UpstreamServer};

const FULL_CONF: &str = r#"user www www;
worker_processes 5;
error_log logs/error.log;
pid logs/nginx.pid;
worker_rlimit_nofile 8192;
events { worker_connections 4096; } http {
include mime.types;
include proxy.conf;
include fastcgi.conf;
index index.html index.htm index.php;
default_type application/octet-stream;
log_format main '$remote_addr - $remote_user [$time_local]  $status '
'"$request" $body_bytes_sent "$http_referer" '
' "$http_user_agent" "$http_x_forwarded_for"';
access_log logs/access.log main;
sendfile on;
tcp_nopush on;
server_names_hash_bucket_size 128;
server {
listen 80;
server_name domain1.com www.domain1.com;
access_log logs/domain1.access.log main;
root html;
location ~ \.php$ {
fastcgi_pass 127.0.0.1:1025; } } server {
listen 80;
server_name domain2.com www.domain2.com;
access_log logs/domain2.access.log main;
location ~ ^/(images|javascript|js|css|flash|media|static)/ {
root /var/www/virtual/big.server.com/htdocs;
expires 30d;
} location / { proxy_pass http://127.0.0.1:8080; } }
upstream big_server_com {
server 127.0.0.3:8000 weight=5;
server 127.0.0.3:8001 weight=5;
server 192.168.0.1:8000;
server 192.168.0.1:8001;
} server { listen 80;
server_name big.server.com;
access_log logs/big.server.access.log main;
location / { proxy_pass http://big_server_com; } } }"#;

#[test]
fn full_example_roundtrip() {
    let parsed = parse(FULL_CONF).unwrap();
    for style in [Style::indented(), Style::compact()] {
        let rendered = dump_config(&parsed, &style);
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(parsed.block, reparsed.block, "round-trip failed for {style:?}");
    }
}

#[test]
fn full_example_structure() {
    let config = parse(FULL_CONF).unwrap();
    let upstreams = config.find_upstreams();
    assert_eq!(upstreams.len(), 1);
    assert_eq!(upstreams[0].name(), "big_server_com");
    assert_eq!(upstreams[0].servers().count(), 4);
    assert_eq!(
        upstreams[0].servers().next().unwrap().parameters,
        vec![("weight".to_string(), "5".to_string())]
    );
}

#[test]
fn adding_server_scenario() {
    let mut config =
        parse("http{ upstream my_backend{ server 127.0.0.1:443; server 127.0.0.2:443 backup; } }")
            .unwrap();

    {
        let mut upstreams = config.find_upstreams_mut();
        assert_eq!(upstreams.len(), 1);
        assert_eq!(upstreams[0].name(), "my_backend");
        let servers: Vec<_> = upstreams[0].servers().collect();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].flags, vec!["backup".to_string()]);

        upstreams[0].add_server(
            UpstreamServer::new("127.0.0.1:443")
                .parameter("weight", "5")
                .flag("down"),
        );
    }

    let upstreams = config.find_upstreams();
    assert_eq!(upstreams[0].servers().count(), 3);

    let rendered = dump_config(&config, &Style::indented());
    assert!(
        rendered.contains("server 127.0.0.1:443 weight=5 down;"),
        "missing added server line in:\n{rendered}"
    );
}

#[test]
fn serializes_to_json() {
    let config = parse("upstream pool { server 10.0.0.1:80 weight=2 down; }").unwrap();
    let json = serde_json::to_value(&config).unwrap();
    let pool = &json["block"]["entries"][0]["Upstream"];
    assert_eq!(pool["directive"]["name"], "upstream");
}
