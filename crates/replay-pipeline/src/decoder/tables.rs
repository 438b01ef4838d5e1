// SPDX-License-Identifier: Apache-2.0

//! Declarative field tables for every recognized line tag.
//!
//! Each table maps output field names to 1-based CSV payload columns. The
//! tables are the authoritative wire contract with the dashboards consuming
//! the pushed streams: names, order, and column assignments must not drift.
//! Several tables carry intentional asymmetries inherited from the emitting
//! firmware (skipped columns, a column feeding two fields, variants that pin
//! a field to missing) and those are preserved verbatim.

use crate::record::Tag;

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// 1-based CSV payload column, coerced leniently to an integer.
    Column(usize),
    /// Column coerced to an integer, then transformed to `10 * log10(v)`
    /// when positive; missing otherwise.
    Log10(usize),
    /// Column modulo 1000; zero when the column is missing.
    Mod1000(usize),
    /// Column divided by 1000 as a float; zero when the column is missing.
    Div1000(usize),
    /// Always missing for this line variant.
    Fixed,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub source: FieldSource,
}

const fn col(name: &'static str, column: usize) -> FieldSpec {
    FieldSpec {
        name,
        source: FieldSource::Column(column),
    }
}

const fn log10(name: &'static str, column: usize) -> FieldSpec {
    FieldSpec {
        name,
        source: FieldSource::Log10(column),
    }
}

const fn fixed(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        source: FieldSource::Fixed,
    }
}

/// Everything the decoder needs to recognize and extract one line tag.
#[derive(Debug, Clone, Copy)]
pub struct TagSpec {
    pub tag: Tag,
    /// Concrete variant name for tags folding several line variants together.
    pub tag_raw: Option<&'static str>,
    /// Token after the `>` marker that identifies the line.
    pub line_token: &'static str,
    /// Per-tag processed-records counter name.
    pub counter: &'static str,
    /// Field carrying the entity (terminal) identifier for this tag.
    pub entity_field: &'static str,
    /// Field carrying the HARQ process identifier, when the tag has one.
    pub process_field: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

pub const DPP_BASIC: TagSpec = TagSpec {
    tag: Tag::DppBasic,
    tag_raw: None,
    line_token: "DPP_BASIC",
    counter: "dpp_basic_logs_processed_total",
    entity_field: "ue_id",
    process_field: Some("process_id"),
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 2),
        col("ue_id", 3),
        col("call_id", 4),
        col("crc", 5),
        col("retx_cnt", 6),
        col("process_id", 7),
        col("rnti", 8),
        col("mcs_level", 9),
        col("service_type", 10),
        col("u_size", 11),
        col("n_power_ratio", 12),
        col("cqiRequest*1000+ReportHeadroom", 13),
        col("SIR_before_SIC_0", 14),
        col("nInstDmrsSinrdB", 15),
        col("uPuschIndex*100000+uPuschOffsetAntNum*100+mimo_en", 16),
        col("rb_cnt", 17),
        col("pdecode_n_timeoffset", 18),
        col("n_time_offset_0", 19),
        col("n_time_offset_1", 20),
        col("snr_0+snr_1", 21),
        col("snr_2+snr_3", 22),
        col("a_air_time", 23),
        col("pdecode_packet", 24),
        col("bSpsEnable*1000+isUlCompnOn*10+bBundlingPDU", 25),
        col("push_dtx_threshold", 26),
        col("PreRlfStayCount+isPreRlfFlagOn", 27),
        col("uCompJRAntNumFromModem*1000+uCompSearchIndex*100+uLlrCombStat*10+bHarqEnable", 28),
        col("handover_reconfig_status", 29),
        col("ul_tx_skip_qci_flags", 30),
        col("dlca_isPCellCaUeOn*1000+dlca_isSCellCaUeOn*100+ulca_isPCellCaUeOn*10+ulca_isSCellCaUeOn", 31),
    ],
};

pub const PB_BASIC: TagSpec = TagSpec {
    tag: Tag::PbBasic,
    tag_raw: None,
    line_token: "PB_BASIC",
    counter: "pb_basic_logs_processed_total",
    entity_field: "ue_id",
    process_field: Some("process_id"),
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 2),
        col("ue_id", 3),
        col("call_id", 4),
        col("handoverStartInd*100+isReconfigDisable*10+ReconfigStatus", 5),
        col("isUplink256QamEnable*10000u+isBundlingEnable*1000u+NoResourceRestrictionForTTIBundling*100u+isEharqPatternFddOn*10u+isQciOneEnable", 6),
        col("isPCellCaUeOn<<3+isSCellCaUeOn<<2+isPCellCaUeOn<<1+isSCellCaUeOn", 7),
        col("u_service_type", 8),
        col("u_mcs_level", 9),
        col("bPduBuildFail*1000u+bRetxPdu", 10),
        col("u_retx_cnt", 11),
        col("u_size", 12),
        col("process_id", 13),
        col("u_prb_offset", 14),
        col("u_rb_cnt", 15),
        col("u_rnti", 16),
        col("u_tpc_cmd", 17),
        col("uAggregateLevel*10000000+uDciGain", 18),
        col("uLid*10000u+uRid*100+uMirroringEnable*10+bHoppingEnable", 19),
        col("u_cqi_request_cnt", 20),
        col("u_cqi_request[0]", 21),
        col("u_cqi_request[1]", 22),
        col("bPrachRbInSf*100+bDummyGrantFlag", 23),
        col("bAdaptiveRetxReq*100u+bNonAdaptiveRetx*10u+bAdaptiveRetx", 24),
        col("u_link_index", 25),
        col("b_multi_cluster_pusch_support", 26),
        col("u_vrb_offset_cL1", 27),
        col("=uRbCntCL0<<8+uRbCntCL1", 28),
        col("DownlinkChannelRcd.Cqi", 29),
        col("UlPowerControlUePm.ReportHeadroom", 30),
        col("uplink_drx_prepare_active_period_check", 31),
        col("uCompSearchIndex*100u+uInterTtiRsCType*10u+bPuschDmrsCombining", 32),
        col("isHpaUe*10000u+bUplink256QamEnable*1000u+Ul256QamReconfigState", 33),
    ],
};

pub const URAC_RA: TagSpec = TagSpec {
    tag: Tag::UracRa,
    tag_raw: None,
    line_token: "URAC_RA",
    counter: "urac_ra_logs_processed_total",
    entity_field: "U_id",
    process_field: Some("process_id"),
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 2),
        col("U_id", 3),
        col("rnti", 4),
        col("service_type", 5),
        col("vo_nr_info", 6),
        col("bUl_mu_candidate*10000+u_mimo_mode*100+u_layer_cnt", 7),
        col("dci_format_indicator", 8),
        col("cce_offset", 9),
        col("coreset_id", 10),
        col("aggregate_level", 11),
        col("bForcedMrcOffFlag*100+bMrcOnOff*10+ulBfMode-or-0", 12),
        col("mcs_level", 13),
        col("dci_mcs_level", 14),
        col("size", 15),
        col("qam_info", 16),
        col("start_symbol", 17),
        col("length_symbol", 18),
        col("k2", 19),
        col("ul_waveform_dmrs_fdm_info", 20),
        col("process_id", 21),
        col("retx_cnt", 22),
        col("dtx_cnt", 23),
        col("crb_offset", 24),
        col("rb_cnt", 25),
        col("rbg_bitmap", 26),
        col("uci_mux_type", 27),
        col("rda_info", 28),
        col("bwp_info", 29),
        col("ul_ca_act_info", 30),
        col("allocation_list_pdu_cnt", 31),
        col("allocation_list_pdcch_airtime", 32),
        col("allocation_list_pusch_airtime", 33),
    ],
};

pub const UMRC_DP: TagSpec = TagSpec {
    tag: Tag::UmrcDp,
    tag_raw: None,
    line_token: "UMRC_DP",
    counter: "umrc_dp_logs_processed_total",
    entity_field: "U_id",
    process_field: Some("process_id"),
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 2),
        col("U_id", 3),
        col("air_time", 4),
        col("pdu_cnt", 5),
        col("crc", 6),
        col("rnti", 7),
        col("mimo_mode*100+selected_rx_mode", 8),
        col("retx_pdu", 9),
        col("retx_cnt", 10),
        col("process_id", 11),
        col("mcs_level", 12),
        col("rb_index", 13),
        col("rb_cnt", 14),
        col("rbg_bit_map", 15),
        col("physical_ant_bit_map", 16),
        col("size", 17),
        col("packet_offset", 18),
        col("time_offset", 19),
        col("valid_time_info", 20),
        col("new_tx_air_time", 21),
        col("additional_harq_info", 22),
        col("service_type", 23),
        col("uci_mux_info", 24),
        col("forced_mrcOff_flag*100+mrc_on_off*10+ulbfMode", 25),
        col("harq_buffer_overflow", 26),
        log10("SINR[0]", 27),
        log10("SINR[1]", 28),
        log10("preSINR[0]", 29),
        log10("preSINR[1]", 30),
        col("preamble_index", 31),
        col("slot_agg_pdu_index", 32),
        col("ul_ca_act_info", 33),
    ],
};

pub const ULCA_PHR_PWR_AL: TagSpec = TagSpec {
    tag: Tag::UlcaPhrPwrAl,
    tag_raw: None,
    line_token: "ULCA_PHR_PWR_AL",
    counter: "ulca_phr_pwr_al_logs_processed_total",
    entity_field: "U_id",
    process_field: None,
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 2),
        col("U_id", 3),
        col("ca_cc_id", 4),
        col("equal_power_sharing_result", 5),
        col("ul_ca_power_split_mode", 6),
        col("pcmax_dbm", 7),
        col("pcmax_linear", 8),
        col("pcmaxc_dbm", 9),
        col("pcmaxc_linear", 10),
        col("sum_pcmaxc_linear", 11),
        col("req_tx_power_per_rb_dbm", 12),
        col("req_tx_power_full_rb_linear", 13),
        col("scell_scheduling_disable_flag", 14),
        col("ul_ca_allocated_power_linear", 15),
        col("ul_ca_allocated_power_dbm", 16),
        col("ul_ca_power_alloc_flag", 17),
    ],
};

// The SCELL/PCELL state lines put their sector in column 3 and entity in
// column 4; column 2 is unused across the family.
pub const SCELL_STATE_ULCA: TagSpec = TagSpec {
    tag: Tag::ScellStateUlca,
    tag_raw: None,
    line_token: "SCELL_STATE_ULCA",
    counter: "scell_state_ulca_logs_processed_total",
    entity_field: "ue_id",
    process_field: None,
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 3),
        col("ue_id", 4),
        col("pcell_Uid", 5),
        col("prev_state", 6),
        col("u_state", 7),
        col("pcell_index", 8),
        col("activation_bitmap", 9),
        col("uid_bitmap", 10),
        col("ul_activation_trigger", 11),
        col("pdcch_order_tx_cnt", 12),
        col("ul_repreparing_timer", 13),
        col("pdcch_order_ack_flag", 14),
        col("push_rx_flag", 15),
        col("ul_deactivation_times", 16),
        col("link_state", 17),
        col("link_timer", 18),
        col("scell_ta_link_state", 19),
    ],
};

// The three PCELL_STATE_* variants serialize the same field set so the
// streams stay union-schema compatible; each variant pins the fields its
// line does not carry to missing. Column quirks (the out-of-range
// `is_deact_infinite_on` column on ULCA, the skipped columns 9 and 24, and
// column 8 feeding two fields on CHANGE) mirror the emitting firmware.
pub const PCELL_STATE_ULCA: TagSpec = TagSpec {
    tag: Tag::PcellState,
    tag_raw: Some("PCELL_STATE_ULCA"),
    line_token: "PCELL_STATE_ULCA",
    counter: "pcell_state_ulca_logs_processed_total",
    entity_field: "ue_id",
    process_field: None,
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 3),
        col("ue_id", 4),
        fixed("uemng_p2su"),
        col("prev_state", 5),
        col("u_state", 6),
        fixed("u_cell_num"),
        fixed("logical_cell_id"),
        col("pCaStat_bActMacCeExist", 7),
        col("sCell_act_bitmap", 8),
        col("deactivation_timer", 10),
        col("is_deact_infinite_on", 111),
        col("num_of_continuous_err", 12),
        col("pdsh_harq_acked", 13),
        col("deact_mac_ce_exist", 14),
        col("max_deactivation_timer", 15),
        col("act_mac_ce_ack_flag", 16),
        col("act_mac_ce_retx_cnt", 17),
        col("cqi_zero_count", 18),
        col("common_ca_ud_pm_be_bitmap", 19),
        col("dl_ca_ue_pm_scell_num", 20),
        fixed("activation_req_bitmap"),
        fixed("scell_activation_bitmap"),
        fixed("ul_activation_trigger"),
        fixed("ul_deactivation_timer"),
        fixed("is_inter_site_ca_config_on"),
        fixed("backhaul_outage"),
        fixed("uhead*1000_utail"),
        fixed("uid_cnt"),
        fixed("max_transit_enqueu_per_tti"),
        fixed("pre_commit"),
        fixed("is_ue_massive_mimo_enable"),
        fixed("is_scell_srs_support_on"),
        fixed("scell_index*1000_scell_element"),
        fixed("cell_load_high_for_scell"),
    ],
};

pub const PCELL_STATE_CHANGE: TagSpec = TagSpec {
    tag: Tag::PcellState,
    tag_raw: Some("PCELL_STATE_CHANGE"),
    line_token: "PCELL_STATE_CHANGE",
    counter: "pcell_state_change_logs_processed_total",
    entity_field: "ue_id",
    process_field: None,
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 3),
        col("ue_id", 4),
        col("uemng_p2su", 5),
        col("prev_state", 6),
        col("u_state", 7),
        col("u_cell_num", 8),
        col("logical_cell_id", 8),
        col("pCaStat_bActMacCeExist", 9),
        col("sCell_act_bitmap", 10),
        col("deactivation_timer", 11),
        col("is_deact_infinite_on", 12),
        col("num_of_continuous_err", 13),
        col("pdsh_harq_acked", 14),
        col("deact_mac_ce_exist", 15),
        col("max_deactivation_timer", 16),
        col("act_mac_ce_ack_flag", 17),
        col("act_mac_ce_retx_cnt", 18),
        col("cqi_zero_count", 19),
        col("common_ca_ud_pm_be_bitmap", 20),
        col("dl_ca_ue_pm_scell_num", 21),
        col("activation_req_bitmap", 22),
        fixed("scell_activation_bitmap"),
        col("ul_activation_trigger", 23),
        col("ul_deactivation_timer", 24),
        FieldSpec {
            name: "is_inter_site_ca_config_on",
            source: FieldSource::Mod1000(25),
        },
        FieldSpec {
            name: "backhaul_outage",
            source: FieldSource::Div1000(25),
        },
        col("uhead*1000_utail", 26),
        col("uid_cnt", 27),
        col("max_transit_enqueu_per_tti", 28),
        col("pre_commit", 29),
        col("is_ue_massive_mimo_enable", 30),
        col("is_scell_srs_support_on", 31),
        col("scell_index*1000_scell_element", 32),
        col("cell_load_high_for_scell", 33),
    ],
};

pub const PCELL_STATE_ACT: TagSpec = TagSpec {
    tag: Tag::PcellState,
    tag_raw: Some("PCELL_STATE_ACT"),
    line_token: "PCELL_STATE_ACT",
    counter: "pcell_state_act_logs_processed_total",
    entity_field: "ue_id",
    process_field: None,
    fields: &[
        col("macgps_time", 1),
        col("sector_id", 3),
        col("ue_id", 4),
        col("uemng_p2su", 5),
        col("prev_state", 6),
        col("u_state", 7),
        fixed("u_cell_num"),
        col("logical_cell_id", 8),
        col("pCaStat_bActMacCeExist", 9),
        col("sCell_act_bitmap", 10),
        col("deactivation_timer", 11),
        col("is_deact_infinite_on", 12),
        col("num_of_continuous_err", 13),
        col("pdsh_harq_acked", 14),
        col("deact_mac_ce_exist", 15),
        col("max_deactivation_timer", 16),
        col("act_mac_ce_ack_flag", 17),
        col("act_mac_ce_retx_cnt", 18),
        col("cqi_zero_count", 19),
        col("common_ca_ud_pm_be_bitmap", 20),
        col("dl_ca_ue_pm_scell_num", 21),
        fixed("activation_req_bitmap"),
        col("scell_activation_bitmap", 22),
        col("ul_activation_trigger", 23),
        fixed("ul_deactivation_timer"),
        col("is_inter_site_ca_config_on", 25),
        col("backhaul_outage", 26),
        col("uhead*1000_utail", 27),
        col("uid_cnt", 28),
        fixed("max_transit_enqueu_per_tti"),
        fixed("pre_commit"),
        fixed("is_ue_massive_mimo_enable"),
        fixed("is_scell_srs_support_on"),
        col("scell_index*1000_scell_element", 29),
        col("cell_load_high_for_scell", 30),
    ],
};
