use crate::*;

const EXTERNAL: &str = "16Uiu2HAmExternalPeerXYZ";

#[tokio::test]
async fn test_mutual_peers_single_edge() {
    let api = spawn_api().await.unwrap();
    api.put_report(report("lighthouse-1", "A-peer-id-0001", &[("B-peer-id-0002", "outbound")]))
        .await
        .unwrap();
    api.put_report(report("prysm-1", "B-peer-id-0002", &[("A-peer-id-0001", "inbound")]))
        .await
        .unwrap();

    let map = api.get_ok("/clients/topology").await.unwrap();
    let nodes = map["nodes"].as_array().unwrap();
    let edges = map["edges"].as_array().unwrap();

    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|n| n["origin"] == "internal"));
    assert_eq!(nodes[0]["label"], "lighthouse-1");

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["from"], "A-peer-id-0001");
    assert_eq!(edges[0]["to"], "B-peer-id-0002");
    assert_eq!(edges[0]["cross_boundary"], false);
}

#[tokio::test]
async fn test_external_peer_is_cross_boundary() {
    let api = spawn_api().await.unwrap();
    api.put_report(report("lighthouse-1", "A-peer-id-0001", &[(EXTERNAL, "inbound")]))
        .await
        .unwrap();

    let map = api.get_ok("/clients/topology").await.unwrap();
    let nodes = map["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1]["id"], EXTERNAL);
    assert_eq!(nodes[1]["origin"], "external");
    assert_eq!(nodes[1]["label"], "16Uiu...erXYZ");
    assert_eq!(nodes[1]["degree"], 1);

    let edge = &map["edges"][0];
    assert_eq!(edge["from"], EXTERNAL);
    assert_eq!(edge["to"], "A-peer-id-0001");
    assert_eq!(edge["cross_boundary"], true);
}

#[tokio::test]
async fn test_malformed_direction_does_not_fail_page() {
    let api = spawn_api().await.unwrap();
    api.put_report(report("lighthouse-1", "A-peer-id-0001", &[(EXTERNAL, "sideways")]))
        .await
        .unwrap();

    let map = api.get_ok("/clients/topology").await.unwrap();
    assert_eq!(map["edges"][0]["from"], "A-peer-id-0001");
    assert_eq!(map["stats"]["malformed_directions"], 1);
}

#[tokio::test]
async fn test_topology_matches_clients_page() {
    let api = spawn_api().await.unwrap();
    api.put_report(report(
        "lighthouse-1",
        "A-peer-id-0001",
        &[("B-peer-id-0002", "outbound"), (EXTERNAL, "outbound")],
    ))
    .await
    .unwrap();
    api.put_report(report("prysm-1", "B-peer-id-0002", &[]))
        .await
        .unwrap();

    let page = api.get_ok("/clients").await.unwrap();
    let map = api.get_ok("/clients/topology").await.unwrap();
    assert_eq!(page["peer_map"], map);

    let degree_sum: u64 = map["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["degree"].as_u64().unwrap())
        .sum();
    assert_eq!(degree_sum, 2 * map["stats"]["observations"].as_u64().unwrap());
}
