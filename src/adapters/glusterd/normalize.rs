//! glusterd output normalization
//!
//! Pure conversions from the raw `--xml` shapes into canonical entities.

use std::collections::HashMap;

use crate::adapters::glusterd::xml::{
    XmlHealBrick, XmlNode, XmlPeer, XmlProfileBrick, XmlQuotaLimit, XmlSnapshot, XmlStatusVolume,
    XmlVolProfile, XmlVolume,
};
use crate::domain::{
    percent_str_to_int, split_brick_name, subvol_bricks_count, Brick, BrickPort, BrickProfile,
    BrickStatus, FopStat, HealEntry, Peer, Quota, Snapshot, Subvolume, Transport, Volume,
    VolumeProfile, VolumeStatus, VolumeType,
};
use crate::error::{Error, Result};

const HEAL_CONNECTED: &str = "Connected";
const HEAL_UNKNOWN_ENTRIES: &str = "-";

/// Group bricks into subvolumes in listing order.
pub fn build_subvols(
    volume: &str,
    volume_type: &VolumeType,
    replica_count: u32,
    disperse_count: u32,
    bricks: &[Brick],
) -> Vec<Subvolume> {
    let per_subvol = subvol_bricks_count(replica_count, disperse_count) as usize;
    let subvol_type = volume_type.subvol_type();

    bricks
        .chunks(per_subvol)
        .enumerate()
        .map(|(idx, chunk)| Subvolume {
            name: format!("{}-{}-{}", volume, subvol_type, idx),
            subvol_type: subvol_type.clone(),
            replica_count,
            disperse_count,
            bricks: chunk.to_vec(),
        })
        .collect()
}

pub(crate) fn volume(raw: XmlVolume) -> Volume {
    let volume_type = VolumeType::parse(&raw.type_str);
    let bricks: Vec<Brick> = raw
        .bricks
        .brick
        .into_iter()
        .map(|b| {
            let (hostname, path) = split_brick_name(&b.name);
            Brick {
                hostname,
                path,
                peer_id: b.host_uuid,
                is_arbiter: b.is_arbiter == 1,
            }
        })
        .collect();
    let subvols = build_subvols(
        &raw.name,
        &volume_type,
        raw.replica_count,
        raw.disperse_count,
        &bricks,
    );
    let options: HashMap<String, String> = raw
        .options
        .option
        .into_iter()
        .map(|o| (o.name, o.value))
        .collect();

    Volume {
        name: raw.name,
        id: raw.id,
        status: raw.status_str,
        volume_type,
        transport: Transport::from_code(&raw.transport),
        bricks,
        subvols,
        dist_count: raw.dist_count,
        replica_count: raw.replica_count,
        arbiter_count: raw.arbiter_count,
        disperse_count: raw.disperse_count,
        redundancy_count: raw.redundancy_count,
        stripe_count: raw.stripe_count,
        options,
    }
}

fn brick_status(raw: XmlNode) -> Result<BrickStatus> {
    let port_field = if raw.port.trim().is_empty() {
        raw.ports.tcp.as_str()
    } else {
        raw.port.as_str()
    };
    Ok(BrickStatus {
        port: BrickPort::parse(port_field)?,
        hostname: raw.hostname,
        path: raw.path,
        peer_id: raw.peerid,
        status: raw.status,
        pid: raw.pid,
        inodes_total: raw.inodes_total,
        inodes_free: raw.inodes_free,
        capacity: raw.size_total,
        free: raw.size_free,
    })
}

pub(crate) fn volume_status(raw: XmlStatusVolume) -> Result<VolumeStatus> {
    let nodes = raw
        .node
        .into_iter()
        .map(brick_status)
        .collect::<Result<Vec<_>>>()?;
    Ok(VolumeStatus {
        name: raw.vol_name,
        nodes,
    })
}

pub(crate) fn quota(volume: &str, raw: XmlQuotaLimit) -> Result<Quota> {
    let soft_limit_percent = percent_str_to_int(&raw.soft_limit_percent).map_err(|e| {
        Error::Parse(format!(
            "volume {} path {}: soft limit percent: {}",
            volume, raw.path, e
        ))
    })?;
    Ok(Quota {
        volume: volume.to_string(),
        path: raw.path,
        used: raw.used_space,
        available: raw.avail_space,
        soft_limit: raw.soft_limit_value,
        soft_limit_percent,
        hard_limit: raw.hard_limit,
        soft_limit_exceeded: raw.sl_exceeded == "Yes",
        hard_limit_exceeded: raw.hl_exceeded == "Yes",
    })
}

pub(crate) fn peer(raw: XmlPeer) -> Peer {
    let addresses = if raw.hostnames.hostname.is_empty() {
        vec![raw.hostname.clone()]
    } else {
        raw.hostnames.hostname
    };
    Peer {
        id: raw.uuid,
        hostname: raw.hostname,
        addresses,
        connected: raw.connected == 1,
    }
}

pub(crate) fn snapshot(raw: XmlSnapshot) -> Snapshot {
    Snapshot {
        name: raw.name,
        id: raw.uuid,
        origin_volume: raw.snap_volume.origin_volume.name,
        status: raw.snap_volume.status,
        description: raw.description,
        created_at: raw.create_time,
        origin_snap_count: raw.snap_volume.origin_volume.snap_count,
        origin_snap_remaining: raw.snap_volume.origin_volume.snap_remaining,
    }
}

pub(crate) fn heal_entry(volume: &str, raw: XmlHealBrick) -> Result<HealEntry> {
    let (hostname, brick_path) = split_brick_name(&raw.name);
    let count = raw.number_of_entries.trim();
    let entries = if count == HEAL_UNKNOWN_ENTRIES || count.is_empty() {
        None
    } else {
        Some(count.parse::<u64>().map_err(|e| {
            Error::Parse(format!(
                "volume {} brick {}: heal entries '{}': {}",
                volume, raw.name, count, e
            ))
        })?)
    };
    Ok(HealEntry {
        volume: volume.to_string(),
        hostname,
        brick_path,
        host_id: raw.host_uuid,
        connected: raw.status == HEAL_CONNECTED,
        entries,
    })
}

fn brick_profile(raw: XmlProfileBrick) -> BrickProfile {
    let stats = raw.cumulative_stats;
    BrickProfile {
        brick: raw.brick_name,
        duration_secs: stats.duration,
        total_reads: stats.total_read,
        total_writes: stats.total_write,
        fops: stats
            .fop_stats
            .fop
            .into_iter()
            .map(|f| FopStat {
                name: f.name,
                hits: f.hits,
                avg_latency: f.avg_latency,
                min_latency: f.min_latency,
                max_latency: f.max_latency,
            })
            .collect(),
    }
}

pub(crate) fn volume_profile(volume: &str, raw: XmlVolProfile) -> VolumeProfile {
    let name = if raw.volname.is_empty() {
        volume.to_string()
    } else {
        raw.volname
    };
    VolumeProfile {
        volume: name,
        bricks: raw.brick.into_iter().map(brick_profile).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::glusterd::xml::{
        decode, HealInfoOutput, ProfileInfoOutput, VolumeInfoOutput, VolumeStatusOutput,
        XmlBrick, XmlBricks,
    };
    use assert_matches::assert_matches;

    fn brick(name: &str) -> Brick {
        let (hostname, path) = split_brick_name(name);
        Brick {
            hostname,
            path,
            peer_id: String::new(),
            is_arbiter: false,
        }
    }

    #[test]
    fn test_build_subvols_replicate() {
        let bricks: Vec<Brick> = (0..6).map(|i| brick(&format!("n{}:/b", i))).collect();
        let subvols = build_subvols(
            "gv0",
            &VolumeType::DistributedReplicate,
            3,
            0,
            &bricks,
        );
        assert_eq!(subvols.len(), 2);
        assert_eq!(subvols[0].name, "gv0-replicate-0");
        assert_eq!(subvols[1].name, "gv0-replicate-1");
        assert_eq!(subvols[1].bricks[0].hostname, "n3");
        assert_eq!(subvols[0].subvol_type, VolumeType::Replicate);
    }

    #[test]
    fn test_build_subvols_distribute() {
        let bricks: Vec<Brick> = (0..3).map(|i| brick(&format!("n{}:/b", i))).collect();
        let subvols = build_subvols("gv1", &VolumeType::Distribute, 0, 0, &bricks);
        assert_eq!(subvols.len(), 3);
        assert!(subvols.iter().all(|s| s.bricks.len() == 1));
    }

    #[test]
    fn test_volume_from_xml() {
        let xml = r#"<cliOutput>
  <opRet>0</opRet><opErrno>0</opErrno><opErrstr/>
  <volInfo>
    <volumes>
      <volume>
        <name>gv0</name>
        <id>6fcb8cd6-2b2b-4e1f-a1a5-5c1fd3f1a4c1</id>
        <status>1</status>
        <statusStr>Started</statusStr>
        <brickCount>4</brickCount>
        <distCount>2</distCount>
        <stripeCount>1</stripeCount>
        <replicaCount>2</replicaCount>
        <arbiterCount>0</arbiterCount>
        <disperseCount>0</disperseCount>
        <redundancyCount>0</redundancyCount>
        <type>7</type>
        <typeStr>Distributed-Replicate</typeStr>
        <transport>0</transport>
        <bricks>
          <brick uuid="p1">n1:/b/1<name>n1:/b/1</name><hostUuid>p1</hostUuid><isArbiter>0</isArbiter></brick>
          <brick uuid="p2">n2:/b/1<name>n2:/b/1</name><hostUuid>p2</hostUuid><isArbiter>0</isArbiter></brick>
          <brick uuid="p1">n1:/b/2<name>n1:/b/2</name><hostUuid>p1</hostUuid><isArbiter>0</isArbiter></brick>
          <brick uuid="p2">n2:/b/2<name>n2:/b/2</name><hostUuid>p2</hostUuid><isArbiter>0</isArbiter></brick>
        </bricks>
        <optCount>1</optCount>
        <options>
          <option><name>diagnostics.count-fop-hits</name><value>on</value></option>
        </options>
      </volume>
      <count>1</count>
    </volumes>
  </volInfo>
</cliOutput>"#;
        let out: VolumeInfoOutput = decode("volume info", xml).unwrap();
        let vol = volume(out.vol_info.volumes.volume.into_iter().next().unwrap());
        assert_eq!(vol.name, "gv0");
        assert!(vol.is_started());
        assert_eq!(vol.transport, Transport::Tcp);
        assert_eq!(vol.volume_type, VolumeType::DistributedReplicate);
        assert_eq!(vol.bricks.len(), 4);
        assert_eq!(vol.bricks[2].path, "/b/2");
        assert_eq!(vol.bricks[1].peer_id, "p2");
        assert_eq!(vol.subvols.len(), 2);
        assert_eq!(vol.subvols[0].subvol_type.to_string(), "replicate");
        assert!(vol.option_enabled("diagnostics.count-fop-hits"));
    }

    #[test]
    fn test_volume_arbiter_flag() {
        let raw = XmlVolume {
            name: "gv2".into(),
            type_str: "Replicate".into(),
            replica_count: 3,
            transport: "1".into(),
            bricks: XmlBricks {
                brick: vec![XmlBrick {
                    name: "n3:/arb".into(),
                    host_uuid: "p3".into(),
                    is_arbiter: 1,
                }],
            },
            ..Default::default()
        };
        let vol = volume(raw);
        assert!(vol.bricks[0].is_arbiter);
        assert_eq!(vol.transport, Transport::Rdma);
    }

    #[test]
    fn test_volume_status_from_xml() {
        let xml = r#"<cliOutput>
  <opRet>0</opRet><opErrno>0</opErrno><opErrstr/>
  <volStatus>
    <volumes>
      <volume>
        <volName>gv0</volName>
        <nodeCount>2</nodeCount>
        <node>
          <hostname>n1</hostname>
          <path>/b/1</path>
          <peerid>p1</peerid>
          <status>1</status>
          <port>49152</port>
          <ports><tcp>49152</tcp><rdma>N/A</rdma></ports>
          <pid>1234</pid>
          <sizeTotal>10737418240</sizeTotal>
          <sizeFree>5368709120</sizeFree>
          <device>/dev/sdb1</device>
          <blockSize>4096</blockSize>
          <fsName>xfs</fsName>
          <inodesTotal>5242880</inodesTotal>
          <inodesFree>5242000</inodesFree>
        </node>
        <node>
          <hostname>n2</hostname>
          <path>/b/1</path>
          <peerid>p2</peerid>
          <status>0</status>
          <port>N/A</port>
          <ports><tcp>N/A</tcp><rdma>N/A</rdma></ports>
          <pid>-1</pid>
        </node>
      </volume>
    </volumes>
  </volStatus>
</cliOutput>"#;
        let out: VolumeStatusOutput = decode("volume status all detail", xml).unwrap();
        let status = volume_status(out.vol_status.volumes.volume.into_iter().next().unwrap())
            .unwrap();
        assert_eq!(status.name, "gv0");
        assert_eq!(status.nodes.len(), 2);

        let online = &status.nodes[0];
        assert_eq!(online.port, BrickPort::Port(49152));
        assert_eq!(online.pid, 1234);
        assert_eq!(online.inodes_total, Some(5242880));
        assert_eq!(online.capacity, 10737418240);

        let offline = &status.nodes[1];
        assert_eq!(offline.port, BrickPort::NotApplicable);
        assert_eq!(offline.status, 0);
        assert_eq!(offline.inodes_total, None);
    }

    #[test]
    fn test_volume_status_bad_port_fails() {
        let raw = XmlStatusVolume {
            vol_name: "gv0".into(),
            node_count: 1,
            node: vec![XmlNode {
                port: "forty".into(),
                ..Default::default()
            }],
        };
        assert_matches!(volume_status(raw), Err(Error::Parse(_)));
    }

    #[test]
    fn test_quota_normalization() {
        let raw = XmlQuotaLimit {
            path: "/a".into(),
            hard_limit: 1000,
            soft_limit_percent: "80%".into(),
            soft_limit_value: 800,
            used_space: 100,
            avail_space: 900,
            sl_exceeded: "No".into(),
            hl_exceeded: "Yes".into(),
        };
        let q = quota("v1", raw).unwrap();
        assert_eq!(q.volume, "v1");
        assert_eq!(q.soft_limit_percent, 80);
        assert!(!q.soft_limit_exceeded);
        assert!(q.hard_limit_exceeded);
    }

    #[test]
    fn test_quota_bad_percent_fails() {
        let raw = XmlQuotaLimit {
            path: "/a".into(),
            soft_limit_percent: "bad".into(),
            ..Default::default()
        };
        assert_matches!(quota("v1", raw), Err(Error::Parse(msg)) if msg.contains("/a"));
    }

    #[test]
    fn test_heal_entries() {
        let xml = r#"<cliOutput>
  <healInfo>
    <bricks>
      <brick hostUuid="p1"><name>n1:/b/1</name><status>Connected</status><numberOfEntries>7</numberOfEntries></brick>
      <brick hostUuid="p2"><name>n2:/b/1</name><status>Transport endpoint is not connected</status><numberOfEntries>-</numberOfEntries></brick>
    </bricks>
  </healInfo>
  <opRet>0</opRet><opErrno>0</opErrno><opErrstr/>
</cliOutput>"#;
        let out: HealInfoOutput = decode("volume heal gv0 info", xml).unwrap();
        let entries: Vec<HealEntry> = out
            .heal_info
            .bricks
            .brick
            .into_iter()
            .map(|b| heal_entry("gv0", b))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries[0].entries, Some(7));
        assert!(entries[0].connected);
        assert_eq!(entries[0].hostname, "n1");
        assert_eq!(entries[1].entries, None);
        assert!(!entries[1].connected);
    }

    #[test]
    fn test_profile_from_xml() {
        let xml = r#"<cliOutput>
  <opRet>0</opRet><opErrno>0</opErrno><opErrstr/>
  <volProfile>
    <volname>gv0</volname>
    <profileOp>3</profileOp>
    <brickCount>1</brickCount>
    <brick>
      <brickName>n1:/b/1</brickName>
      <cumulativeStats>
        <duration>120</duration>
        <totalRead>4096</totalRead>
        <totalWrite>8192</totalWrite>
        <fopStats>
          <fop><name>WRITE</name><hits>12</hits><avgLatency>35.5</avgLatency><minLatency>10.0</minLatency><maxLatency>90.0</maxLatency></fop>
          <fop><name>LOOKUP</name><hits>40</hits><avgLatency>5.0</avgLatency><minLatency>1.0</minLatency><maxLatency>20.0</maxLatency></fop>
        </fopStats>
      </cumulativeStats>
    </brick>
  </volProfile>
</cliOutput>"#;
        let out: ProfileInfoOutput = decode("volume profile gv0 info cumulative", xml).unwrap();
        let profile = volume_profile("gv0", out.vol_profile);
        assert_eq!(profile.volume, "gv0");
        let brick = &profile.bricks[0];
        assert_eq!(brick.duration_secs, 120);
        assert_eq!(brick.total_writes, 8192);
        assert_eq!(brick.fops.len(), 2);
        assert_eq!(brick.fops[0].name, "WRITE");
        assert_eq!(brick.fops[0].hits, 12);
    }
}
