//! Headline pool for the news feed.

/// A static headline: title, summary and source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Headline {
    pub title: &'static str,
    pub summary: &'static str,
    pub source: &'static str,
}

/// Headlines sampled by the news feed. A headline's id is its 1-based
/// position in this list.
pub const HEADLINES: &[Headline] = &[
    Headline {
        title: "S&P 500 edges higher as tech leads midday rebound",
        summary: "Mega-cap tech stocks drive broad gains after early volatility; traders eye Fed commentary.",
        source: "Reuters",
    },
    Headline {
        title: "Oil dips below $80 as demand concerns outweigh supply risks",
        summary: "Crude pulls back amid weak manufacturing data and resilient inventories in key hubs.",
        source: "Bloomberg",
    },
    Headline {
        title: "Treasury yields steady ahead of key inflation report",
        summary: "Bond market holds range as investors await PCE print for direction on rate path.",
        source: "WSJ",
    },
    Headline {
        title: "Dollar slips, euro firms on improving sentiment indicators",
        summary: "FX markets digest upbeat eurozone surveys as greenback retreats from two-week highs.",
        source: "CNBC",
    },
    Headline {
        title: "Chip stocks climb on robust data center demand outlook",
        summary: "Analysts lift forecasts for AI accelerators; semiconductor index outperforms the market.",
        source: "Reuters",
    },
    Headline {
        title: "Gold holds gains as investors seek hedge before earnings deluge",
        summary: "Safe-haven bids persist amid mixed risk tone and sticky core inflation signals.",
        source: "Bloomberg",
    },
    Headline {
        title: "Chinese equities rise on stimulus hopes after policy hints",
        summary: "Beijing signals incremental support; property and consumer names lead the advance.",
        source: "WSJ",
    },
    Headline {
        title: "Crypto extends rally with bitcoin testing resistance",
        summary: "Broader digital assets firm up as spot ETF inflows remain resilient.",
        source: "CoinDesk",
    },
    Headline {
        title: "European banks beat expectations on net interest income",
        summary: "Rate backdrop and cost controls underpin profitability across major lenders.",
        source: "Financial Times",
    },
    Headline {
        title: "US housing starts rebound, supply constraints linger",
        summary: "Builders ramp activity as mortgage rates stabilize; affordability still a headwind.",
        source: "Reuters",
    },
    Headline {
        title: "Tech IPO pipeline builds as volatility cools",
        summary: "Several unicorns revive listing plans following solid debuts in the sector.",
        source: "Bloomberg",
    },
    Headline {
        title: "Energy stocks lag despite firm commodity prices",
        summary: "Rotation favors defensives; utilities and healthcare outperform intraday.",
        source: "CNBC",
    },
    Headline {
        title: "EV makers cut prices to defend market share",
        summary: "Competitive pressures intensify as new models enter and inventories build.",
        source: "WSJ",
    },
    Headline {
        title: "Retail sales point to resilient consumer spending",
        summary: "Discretionary categories surprise to the upside heading into the holiday season.",
        source: "Reuters",
    },
    Headline {
        title: "Software names rally on strong renewal cycles",
        summary: "SaaS cohort benefits from improving seat expansions and lower churn.",
        source: "Bloomberg",
    },
    Headline {
        title: "Airlines guide cautiously on fuel costs, demand steady",
        summary: "Capacity discipline intact; international routes remain the bright spot.",
        source: "CNBC",
    },
    Headline {
        title: "Banks boost capital returns after stress test results",
        summary: "Buybacks and dividend hikes announced across major institutions.",
        source: "WSJ",
    },
    Headline {
        title: "Metals climb as industrial activity shows signs of bottoming",
        summary: "Copper and aluminum tick higher on inventory draws and upbeat PMI beats.",
        source: "Reuters",
    },
    Headline {
        title: "Healthcare gains on positive trial data",
        summary: "Biotech index pops after late-stage results exceed expectations.",
        source: "Bloomberg",
    },
    Headline {
        title: "Utilities extend outperformance as rates ease",
        summary: "Dividend payers bid up in a defensive rotation amid macro uncertainty.",
        source: "CNBC",
    },
];
