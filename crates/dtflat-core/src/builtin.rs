//! Compiled-in board table
//!
//! One descriptor per supported board identity. Every overlay switches all
//! legacy glue nodes over to the flattened binding (`qcom,<soc>-dwc3`,
//! `qcom,snps-dwc3`); the symbol lists are the labels board overlays
//! reference.

use crate::descriptor::{BoardDescriptor, DescriptorError, DescriptorTable, OverlayBlob};
use crate::overlay::COMPATIBLE_TARGET_PREFIX;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// Compatible of unmigrated glue nodes
pub const LEGACY_GLUE_COMPATIBLE: &str = "qcom,dwc3";

/// Compatible of flattened glue nodes
pub const FLATTENED_GLUE_COMPATIBLE: &str = "qcom,snps-dwc3";

struct Board {
    identity: &'static str,
    soc: &'static str,
    symbols: &'static [(&'static str, &'static str)],
}

const BOARDS: &[Board] = &[
    Board {
        identity: "8dev,jalapeno",
        soc: "qcom,ipq4018",
        symbols: &[
            ("usb2_hs_phy", "/soc/usb-phy@a8000"),
            ("usb3_hs_phy", "/soc/usb-phy@a6000"),
            ("usb3_ss_phy", "/soc/usb-phy@9a000"),
        ],
    },
    Board {
        identity: "fxtec,pro1",
        soc: "qcom,msm8998",
        symbols: &[
            ("extcon_usb", "/extcon-usb"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
            ("usb3phy", "/soc@0/phy@c010000"),
        ],
    },
    Board {
        identity: "hp,omnibook-x14",
        soc: "qcom,x1e80100",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17000000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_ss0_hsphy", "/soc@0/phy@fd3000"),
            ("usb_1_ss0_qmpphy", "/soc@0/phy@fd5000"),
            ("usb_1_ss1_hsphy", "/soc@0/phy@fd9000"),
            ("usb_1_ss1_qmpphy", "/soc@0/phy@fda000"),
            ("usb_1_ss2_hsphy", "/soc@0/phy@fde000"),
            ("usb_1_ss2_qmpphy", "/soc@0/phy@fdf000"),
            ("usb_2_hsphy", "/soc@0/phy@88e0000"),
            ("usb_mp_hsphy0", "/soc@0/phy@88e1000"),
            ("usb_mp_qmpphy0", "/soc@0/phy@88e3000"),
        ],
    },
    Board {
        identity: "inforce,ifc6640",
        soc: "qcom,apq8096",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("usb3phy", "/soc@0/phy@7410000"),
        ],
    },
    Board {
        identity: "lenovo,j606f",
        soc: "qcom,sm6115",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@c600000"),
            ("intc", "/soc@0/interrupt-controller@f200000"),
            ("usb_hsphy", "/soc@0/phy@1613000"),
        ],
    },
    Board {
        identity: "lenovo,yoga-c630",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "lg,judyln",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "lg,judyp",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "microsoft,blackrock",
        soc: "qcom,sc8280xp",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_0_hsphy", "/soc@0/phy@88e5000"),
            ("usb_0_qmpphy", "/soc@0/phy@88eb000"),
            ("usb_1_hsphy", "/soc@0/phy@8902000"),
            ("usb_1_qmpphy", "/soc@0/phy@8903000"),
            ("usb_2_hsphy0", "/soc@0/phy@88e7000"),
            ("usb_2_qmpphy0", "/soc@0/phy@88ef000"),
        ],
    },
    Board {
        identity: "oneplus,billie2",
        soc: "qcom,sm4250",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@c600000"),
            ("intc", "/soc@0/interrupt-controller@f200000"),
            ("usb_hsphy", "/soc@0/phy@1613000"),
        ],
    },
    Board {
        identity: "oneplus,cheeseburger",
        soc: "qcom,msm8998",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
        ],
    },
    Board {
        identity: "oneplus,dumpling",
        soc: "qcom,msm8998",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
        ],
    },
    Board {
        identity: "oneplus,oneplus3",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
        ],
    },
    Board {
        identity: "oneplus,oneplus3t",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
        ],
    },
    Board {
        identity: "qcom,apq8094",
        soc: "qcom,apq8094",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@f9000000"),
        ],
    },
    Board {
        identity: "qcom,apq8096",
        soc: "qcom,apq8096",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("usb2_id", "/usb2-id"),
            ("usb3_id", "/usb3-id"),
            ("usb3phy", "/soc@0/phy@7410000"),
        ],
    },
    Board {
        identity: "qcom,ipq4018",
        soc: "qcom,ipq4018",
        symbols: &[
            ("usb2_hs_phy", "/soc/usb-phy@a8000"),
            ("usb3_hs_phy", "/soc/usb-phy@a6000"),
        ],
    },
    Board {
        identity: "qcom,ipq4019",
        soc: "qcom,ipq4019",
        symbols: &[
            ("usb2_hs_phy", "/soc/usb-phy@a8000"),
            ("usb3_hs_phy", "/soc/usb-phy@a6000"),
            ("usb3_ss_phy", "/soc/usb-phy@9a000"),
        ],
    },
    Board {
        identity: "qcom,ipq5018",
        soc: "qcom,ipq5018",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@b000000"),
            ("usbphy0", "/soc@0/phy@5b000"),
        ],
    },
    Board {
        identity: "qcom,ipq5332",
        soc: "qcom,ipq5332",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@b000000"),
            ("usbphy0", "/soc@0/phy@7b000"),
        ],
    },
    Board {
        identity: "qcom,ipq5424",
        soc: "qcom,ipq5424",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@f200000"),
            ("qusb_phy_0", "/soc@0/phy@7b000"),
            ("qusb_phy_1", "/soc@0/phy@71000"),
            ("ssphy_0", "/soc@0/phy@7d000"),
        ],
    },
    Board {
        identity: "qcom,ipq6018",
        soc: "qcom,ipq6018",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@b000000"),
            ("qusb_phy_0", "/soc@0/qusb@79000"),
            ("qusb_phy_1", "/soc@0/qusb@59000"),
            ("ssphy_0", "/soc@0/ssphy@78000"),
        ],
    },
    Board {
        identity: "qcom,ipq8064",
        soc: "qcom,ipq8064",
        symbols: &[
            ("hs_phy_0", "/soc/phy@100f8800"),
            ("hs_phy_1", "/soc/phy@110f8800"),
            ("ss_phy_0", "/soc/phy@100f8830"),
            ("ss_phy_1", "/soc/phy@110f8830"),
        ],
    },
    Board {
        identity: "qcom,ipq8074",
        soc: "qcom,ipq8074",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@b000000"),
            ("qusb_phy_0", "/soc@0/phy@79000"),
            ("qusb_phy_1", "/soc@0/phy@59000"),
            ("ssphy_0", "/soc@0/phy@78000"),
            ("ssphy_1", "/soc@0/phy@58000"),
        ],
    },
    Board {
        identity: "qcom,ipq9574",
        soc: "qcom,ipq9574",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@b000000"),
            ("usb_0_qmpphy", "/soc@0/phy@7d000"),
            ("usb_0_qusbphy", "/soc@0/phy@7b000"),
        ],
    },
    Board {
        identity: "qcom,msm8953",
        soc: "qcom,msm8953",
        symbols: &[
            ("hsusb_phy", "/soc@0/phy@79000"),
            ("intc", "/soc@0/interrupt-controller@b000000"),
        ],
    },
    Board {
        identity: "qcom,msm8992",
        soc: "qcom,msm8992",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@f9000000"),
        ],
    },
    Board {
        identity: "qcom,msm8994",
        soc: "qcom,msm8994",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@f9000000"),
        ],
    },
    Board {
        identity: "qcom,msm8996",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("usb3phy", "/soc@0/phy@7410000"),
        ],
    },
    Board {
        identity: "qcom,msm8998",
        soc: "qcom,msm8998",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
            ("usb3phy", "/soc@0/phy@c010000"),
        ],
    },
    Board {
        identity: "qcom,qcm2290",
        soc: "qcom,qcm2290",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@c600000"),
            ("intc", "/soc@0/interrupt-controller@f200000"),
            ("mpm", "/remoteproc/interrupt-controller"),
            ("usb_hsphy", "/soc@0/phy@1613000"),
            ("usb_qmpphy", "/soc@0/phy@1615000"),
        ],
    },
    Board {
        identity: "qcom,qcm6490",
        soc: "qcom,qcm6490",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e4000"),
        ],
    },
    Board {
        identity: "qcom,qcs404",
        soc: "qcom,qcs404",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@b000000"),
            ("usb2_phy_prim", "/soc@0/phy@7a000"),
            ("usb2_phy_sec", "/soc@0/phy@7c000"),
            ("usb3_phy", "/soc@0/phy@78000"),
        ],
    },
    Board {
        identity: "qcom,qcs615",
        soc: "qcom,qcs615",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_hsphy_2", "/soc@0/phy@88e3000"),
            ("usb_qmpphy", "/soc@0/phy@88e6000"),
        ],
    },
    Board {
        identity: "qcom,qcs8300",
        soc: "qcom,qcs8300",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@8904000"),
            ("usb_2_hsphy", "/soc@0/phy@8906000"),
            ("usb_qmpphy", "/soc@0/phy@8907000"),
        ],
    },
    Board {
        identity: "qcom,qdu1000",
        soc: "qcom,qdu1000",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17200000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e5000"),
        ],
    },
    Board {
        identity: "qcom,qru1000",
        soc: "qcom,qru1000",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17200000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e5000"),
        ],
    },
    Board {
        identity: "qcom,sa8155p",
        soc: "qcom,sa8155p",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb2phy_ac_en1_default", "/soc@0/pinctrl@3100000/usb2phy-ac-en1-default-state"),
            ("usb2phy_ac_en2_default", "/soc@0/pinctrl@3100000/usb2phy-ac-en2-default-state"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "qcom,sa8540p",
        soc: "qcom,sa8540p",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_0_hsphy", "/soc@0/phy@88e5000"),
            ("usb_0_qmpphy", "/soc@0/phy@88eb000"),
            ("usb_1_hsphy", "/soc@0/phy@8902000"),
            ("usb_1_qmpphy", "/soc@0/phy@8903000"),
            ("usb_2_hsphy0", "/soc@0/phy@88e7000"),
            ("usb_2_hsphy1", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy2", "/soc@0/phy@88e9000"),
            ("usb_2_hsphy3", "/soc@0/phy@88ea000"),
            ("usb_2_qmpphy0", "/soc@0/phy@88ef000"),
            ("usb_2_qmpphy1", "/soc@0/phy@88f1000"),
        ],
    },
    Board {
        identity: "qcom,sa8775p",
        soc: "qcom,sa8775p",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_0_hsphy", "/soc@0/phy@88e4000"),
            ("usb_0_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_1_hsphy", "/soc@0/phy@88e6000"),
            ("usb_1_qmpphy", "/soc@0/phy@88ea000"),
            ("usb_2_hsphy", "/soc@0/phy@88e7000"),
        ],
    },
    Board {
        identity: "qcom,sar2130p",
        soc: "qcom,sar2130p",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17200000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_dp_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,sc7180",
        soc: "qcom,sc7180",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,sc7280",
        soc: "qcom,sc7280",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e4000"),
        ],
    },
    Board {
        identity: "qcom,sc8180x",
        soc: "qcom,sc8180x",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_mp_hsphy0", "/soc@0/phy@88e4000"),
            ("usb_mp_hsphy1", "/soc@0/phy@88e5000"),
            ("usb_mp_qmpphy0", "/soc@0/phy@88eb000"),
            ("usb_mp_qmpphy1", "/soc@0/phy@88ec000"),
            ("usb_prim_hsphy", "/soc@0/phy@88e2000"),
            ("usb_prim_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_sec_hsphy", "/soc@0/phy@88e3000"),
            ("usb_sec_qmpphy", "/soc@0/phy@88ee000"),
        ],
    },
    Board {
        identity: "qcom,sc8280xp",
        soc: "qcom,sc8280xp",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_0_hsphy", "/soc@0/phy@88e5000"),
            ("usb_0_qmpphy", "/soc@0/phy@88eb000"),
            ("usb_1_hsphy", "/soc@0/phy@8902000"),
            ("usb_1_qmpphy", "/soc@0/phy@8903000"),
            ("usb_2_hsphy0", "/soc@0/phy@88e7000"),
            ("usb_2_hsphy1", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy2", "/soc@0/phy@88e9000"),
            ("usb_2_hsphy3", "/soc@0/phy@88ea000"),
            ("usb_2_qmpphy0", "/soc@0/phy@88ef000"),
            ("usb_2_qmpphy1", "/soc@0/phy@88f1000"),
        ],
    },
    Board {
        identity: "qcom,sda660",
        soc: "qcom,sda660",
        symbols: &[
            ("extcon_usb", "/extcon-usb"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy0", "/soc@0/phy@c012000"),
            ("qusb2phy1", "/soc@0/phy@c014000"),
            ("usb3_qmpphy", "/soc@0/phy@c010000"),
        ],
    },
    Board {
        identity: "qcom,sdm450",
        soc: "qcom,sdm450",
        symbols: &[
            ("hsusb_phy", "/soc@0/phy@79000"),
            ("intc", "/soc@0/interrupt-controller@b000000"),
        ],
    },
    Board {
        identity: "qcom,sdm630",
        soc: "qcom,sdm630",
        symbols: &[
            ("extcon_usb", "/extcon-usb"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy0", "/soc@0/phy@c012000"),
            ("qusb2phy1", "/soc@0/phy@c014000"),
        ],
    },
    Board {
        identity: "qcom,sdm632",
        soc: "qcom,sdm632",
        symbols: &[
            ("hsusb_phy", "/soc@0/phy@79000"),
            ("intc", "/soc@0/interrupt-controller@b000000"),
        ],
    },
    Board {
        identity: "qcom,sdm636",
        soc: "qcom,sdm636",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy0", "/soc@0/phy@c012000"),
            ("qusb2phy1", "/soc@0/phy@c014000"),
            ("usb3_qmpphy", "/soc@0/phy@c010000"),
        ],
    },
    Board {
        identity: "qcom,sdm660",
        soc: "qcom,sdm660",
        symbols: &[
            ("extcon_usb", "/extcon-usb"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy0", "/soc@0/phy@c012000"),
            ("qusb2phy1", "/soc@0/phy@c014000"),
        ],
    },
    Board {
        identity: "qcom,sdm670",
        soc: "qcom,sdm670",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
        ],
    },
    Board {
        identity: "qcom,sdm845",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "qcom,sdm845-mtp",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "qcom,sdx55",
        soc: "qcom,sdx55",
        symbols: &[
            ("apps_smmu", "/soc/iommu@15000000"),
            ("intc", "/soc/interrupt-controller@17800000"),
            ("pdc", "/soc/interrupt-controller@b210000"),
            ("usb_hsphy", "/soc/phy@ff4000"),
            ("usb_qmpphy", "/soc/phy@ff6000"),
        ],
    },
    Board {
        identity: "qcom,sdx65",
        soc: "qcom,sdx65",
        symbols: &[
            ("apps_smmu", "/soc/iommu@15000000"),
            ("intc", "/soc/interrupt-controller@17800000"),
            ("pdc", "/soc/interrupt-controller@b210000"),
            ("usb_hsphy", "/soc/phy@ff4000"),
            ("usb_qmpphy", "/soc/phy@ff6000"),
        ],
    },
    Board {
        identity: "qcom,sdx75",
        soc: "qcom,sdx75",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17200000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_hsphy", "/soc@0/phy@ff4000"),
            ("usb_qmpphy", "/soc@0/phy@ff6000"),
        ],
    },
    Board {
        identity: "qcom,sm4250",
        soc: "qcom,sm4250",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@c600000"),
            ("intc", "/soc@0/interrupt-controller@f200000"),
            ("usb_hsphy", "/soc@0/phy@1613000"),
            ("usb_qmpphy", "/soc@0/phy@1615000"),
        ],
    },
    Board {
        identity: "qcom,sm6115",
        soc: "qcom,sm6115",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@c600000"),
            ("intc", "/soc@0/interrupt-controller@f200000"),
            ("usb_hsphy", "/soc@0/phy@1613000"),
            ("usb_qmpphy", "/soc@0/phy@1615000"),
        ],
    },
    Board {
        identity: "qcom,sm6125",
        soc: "qcom,sm6125",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@c600000"),
            ("extcon_usb", "/extcon-usb"),
            ("hsusb_phy1", "/soc@0/phy@1613000"),
            ("intc", "/soc@0/interrupt-controller@f200000"),
        ],
    },
    Board {
        identity: "qcom,sm6350",
        soc: "qcom,sm6350",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,sm6375",
        soc: "qcom,sm6375",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@c600000"),
            ("intc", "/soc@0/interrupt-controller@f200000"),
            ("mpm", "/interrupt-controller"),
            ("usb_1_hsphy", "/soc@0/phy@162b000"),
        ],
    },
    Board {
        identity: "qcom,sm7125",
        soc: "qcom,sm7125",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,sm7225",
        soc: "qcom,sm7225",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,sm7325",
        soc: "qcom,sm7325",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_hsphy", "/soc@0/phy@88e4000"),
        ],
    },
    Board {
        identity: "qcom,sm8150",
        soc: "qcom,sm8150",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "qcom,sm8250",
        soc: "qcom,sm8250",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e4000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "qcom,sm8350",
        soc: "qcom,sm8350",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e4000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "qcom,sm8350-hdk",
        soc: "qcom,sm8350",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e4000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
            ("usb_hub_enabled_state", "/soc@0/pinctrl@f100000/usb-hub-enabled-state"),
        ],
    },
    Board {
        identity: "qcom,sm8450",
        soc: "qcom,sm8450",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17100000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,sm8550",
        soc: "qcom,sm8550",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17100000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_dp_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,sm8650",
        soc: "qcom,sm8650",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17100000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_dp_qmpphy", "/soc@0/phy@88e8000"),
        ],
    },
    Board {
        identity: "qcom,x1e80100",
        soc: "qcom,x1e80100",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17000000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_ss0_hsphy", "/soc@0/phy@fd3000"),
            ("usb_1_ss0_qmpphy", "/soc@0/phy@fd5000"),
            ("usb_1_ss1_hsphy", "/soc@0/phy@fd9000"),
            ("usb_1_ss1_qmpphy", "/soc@0/phy@fda000"),
            ("usb_1_ss2_hsphy", "/soc@0/phy@fde000"),
            ("usb_1_ss2_qmpphy", "/soc@0/phy@fdf000"),
            ("usb_2_hsphy", "/soc@0/phy@88e0000"),
            ("usb_mp_hsphy0", "/soc@0/phy@88e1000"),
            ("usb_mp_hsphy1", "/soc@0/phy@88e2000"),
            ("usb_mp_qmpphy0", "/soc@0/phy@88e3000"),
            ("usb_mp_qmpphy1", "/soc@0/phy@88e5000"),
        ],
    },
    Board {
        identity: "samsung,starqltechn",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "samsung,w737",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "shift,axolotl",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "sony,dora-row",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("usb3_id", "/usb3-id"),
        ],
    },
    Board {
        identity: "sony,kagura-row",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("usb3_id", "/usb3-id"),
        ],
    },
    Board {
        identity: "sony,keyaki-row",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("usb3_id", "/usb3-id"),
        ],
    },
    Board {
        identity: "sony,xperia-lilac",
        soc: "qcom,msm8998",
        symbols: &[
            ("extcon_usb", "/extcon-usb"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
            ("usb3phy", "/soc@0/phy@c010000"),
        ],
    },
    Board {
        identity: "sony,xperia-maple",
        soc: "qcom,msm8998",
        symbols: &[
            ("extcon_usb", "/extcon-usb"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
            ("usb3phy", "/soc@0/phy@c010000"),
        ],
    },
    Board {
        identity: "sony,xperia-poplar",
        soc: "qcom,msm8998",
        symbols: &[
            ("extcon_usb", "/extcon-usb"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
            ("usb3phy", "/soc@0/phy@c010000"),
        ],
    },
    Board {
        identity: "thundercomm,db845c",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "xiaomi,beryllium",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "xiaomi,beryllium-ebbg",
        soc: "qcom,sdm845",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc_intc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e2000"),
            ("usb_1_qmpphy", "/soc@0/phy@88e8000"),
            ("usb_2_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "xiaomi,elish",
        soc: "qcom,sm8250",
        symbols: &[
            ("apps_smmu", "/soc@0/iommu@15000000"),
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("pdc", "/soc@0/interrupt-controller@b220000"),
            ("usb_1_hsphy", "/soc@0/phy@88e3000"),
            ("usb_2_hsphy", "/soc@0/phy@88e4000"),
            ("usb_2_qmpphy", "/soc@0/phy@88eb000"),
        ],
    },
    Board {
        identity: "xiaomi,gemini",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("typec", "/soc@0/i2c@75b7000/typec@47"),
        ],
    },
    Board {
        identity: "xiaomi,natrium",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("typec", "/soc@0/i2c@75b7000/typec@47"),
        ],
    },
    Board {
        identity: "xiaomi,sagit",
        soc: "qcom,msm8998",
        symbols: &[
            ("intc", "/soc@0/interrupt-controller@17a00000"),
            ("qusb2phy", "/soc@0/phy@c012000"),
        ],
    },
    Board {
        identity: "xiaomi,scorpio",
        soc: "qcom,msm8996",
        symbols: &[
            ("hsusb_phy1", "/soc@0/phy@7411000"),
            ("hsusb_phy2", "/soc@0/phy@7412000"),
            ("intc", "/soc@0/interrupt-controller@9bc0000"),
            ("typec", "/soc@0/i2c@75b7000/typec@47"),
        ],
    },
];

fn retarget_fragment(soc: &str, target: &str) -> Value {
    json!({
        "target": target,
        "node": {
            "properties": {
                "compatible": [format!("{soc}-dwc3"), FLATTENED_GLUE_COMPATIBLE],
            },
        },
    })
}

/// Overlay retargeting the glue nodes at `glue_paths` to the flattened binding
#[must_use]
pub fn glue_overlay(soc: &str, glue_paths: &[&str]) -> OverlayBlob {
    let fragments: Vec<_> = glue_paths
        .iter()
        .map(|path| retarget_fragment(soc, path))
        .collect();
    OverlayBlob::from(json!({ "fragments": fragments }).to_string())
}

/// Overlay retargeting every node still tagged [`LEGACY_GLUE_COMPATIBLE`]
#[must_use]
pub fn legacy_glue_overlay(soc: &str) -> OverlayBlob {
    let target = format!("{COMPATIBLE_TARGET_PREFIX}{LEGACY_GLUE_COMPATIBLE}");
    let fragments = [retarget_fragment(soc, &target)];
    OverlayBlob::from(json!({ "fragments": fragments }).to_string())
}

fn build() -> Result<DescriptorTable, DescriptorError> {
    DescriptorTable::new(
        BOARDS
            .iter()
            .map(|b| {
                BoardDescriptor::new(b.identity, LEGACY_GLUE_COMPATIBLE)
                    .with_symbols(b.symbols.iter().copied())
                    .with_overlay(legacy_glue_overlay(b.soc))
            })
            .collect(),
    )
}

static BUILTIN: Lazy<Result<DescriptorTable, DescriptorError>> = Lazy::new(build);

impl DescriptorTable {
    /// The compiled-in table, built on first use
    ///
    /// # Errors
    /// Returns error if the compiled-in data is inconsistent
    pub fn builtin() -> Result<&'static DescriptorTable, DescriptorError> {
        BUILTIN.as_ref().map_err(Clone::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayDocument;
    use dtflat_symbol::{SymbolEntry, SymbolValidator};

    #[test]
    fn builtin_table_builds() {
        let table = DescriptorTable::builtin().unwrap();
        assert_eq!(table.len(), BOARDS.len());
        assert_eq!(table.len(), 90);
        assert!(table.lookup("lenovo,yoga-c630").is_some());
        assert!(table.lookup("unknown,board").is_none());
    }

    #[test]
    fn covers_every_board_family() {
        let table = DescriptorTable::builtin().unwrap();
        for identity in [
            "8dev,jalapeno",
            "qcom,apq8094",
            "qcom,ipq4019",
            "qcom,ipq8074",
            "qcom,ipq9574",
            "qcom,msm8996",
            "qcom,msm8998",
            "qcom,qcs8300",
            "qcom,sa8775p",
            "qcom,sc8280xp",
            "qcom,sdx75",
            "qcom,sm8150",
            "qcom,sm8650",
            "microsoft,blackrock",
            "sony,xperia-poplar",
            "xiaomi,scorpio",
        ] {
            assert!(table.lookup(identity).is_some(), "{identity}");
        }
    }

    #[test]
    fn board_symbols_are_carried_over() {
        let table = DescriptorTable::builtin().unwrap();
        let apq8094 = table.lookup("qcom,apq8094").unwrap();
        assert_eq!(
            apq8094.symbols(),
            [SymbolEntry::new("intc", "/soc@0/interrupt-controller@f9000000")]
        );
        let ipq4018 = table.lookup("qcom,ipq4018").unwrap();
        assert_eq!(ipq4018.symbols()[0].path, "/soc/usb-phy@a8000");
    }

    #[test]
    fn builtin_symbols_are_valid() {
        let validator = SymbolValidator::new();
        for board in DescriptorTable::builtin().unwrap().iter() {
            assert!(
                validator.validate(board.symbols()).is_ok(),
                "{}",
                board.identity()
            );
            assert_eq!(board.legacy_match(), LEGACY_GLUE_COMPATIBLE);
        }
    }

    #[test]
    fn builtin_overlays_retarget_every_legacy_node() {
        let target = format!("{COMPATIBLE_TARGET_PREFIX}{LEGACY_GLUE_COMPATIBLE}");
        for board in DescriptorTable::builtin().unwrap().iter() {
            let doc = OverlayDocument::decode(board.overlay()).unwrap();
            assert_eq!(doc.fragments.len(), 1, "{}", board.identity());
            assert_eq!(doc.fragments[0].target, target);
            assert!(doc.fragments[0].node.properties["compatible"]
                .contains_string(FLATTENED_GLUE_COMPATIBLE));
        }
    }

    #[test]
    fn path_overlay_names_soc() {
        let blob = glue_overlay("qcom,sdm845", &["/soc@0/usb@a6f8800", "/soc@0/usb@a8f8800"]);
        let doc = OverlayDocument::decode(&blob).unwrap();
        assert_eq!(doc.fragments.len(), 2);
        assert_eq!(doc.fragments[1].target, "/soc@0/usb@a8f8800");
        assert!(doc.fragments[1].node.properties["compatible"].contains_string("qcom,sdm845-dwc3"));
    }
}
